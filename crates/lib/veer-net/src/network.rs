use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use veer_core::edge::{EdgeId, NextEdges};

use crate::error::NetError;

const EDGE_TAG: &[u8] = b"edge";
const CONNECTION_TAG: &[u8] = b"connection";

/// Directed one-hop reachability between the non-internal edges of a network.
/// Every known edge is a key, including dead ends.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    next_edges: IndexMap<EdgeId, NextEdges>,
}

impl Adjacency {
    pub fn next_edges(&self, edge: &EdgeId) -> Option<&NextEdges> {
        self.next_edges.get(edge)
    }

    pub fn contains(&self, edge: &EdgeId) -> bool {
        self.next_edges.contains_key(edge)
    }

    pub fn len(&self) -> usize {
        self.next_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeId, &NextEdges)> {
        self.next_edges.iter()
    }
}

impl FromIterator<(EdgeId, NextEdges)> for Adjacency {
    fn from_iter<T: IntoIterator<Item = (EdgeId, NextEdges)>>(iter: T) -> Self {
        Self {
            next_edges: iter.into_iter().collect(),
        }
    }
}

/// The parts of a SUMO `.net.xml` file the router needs: the plain edges and the
/// junction connections between them.
#[derive(Clone, Debug, Default)]
pub struct SumoNet {
    edges: Vec<EdgeId>,
    connections: Vec<(EdgeId, EdgeId)>,
}

impl SumoNet {
    pub fn from_file(net_file: &Path) -> Result<Self, NetError> {
        let file = File::open(net_file).map_err(|source| NetError::Open {
            path: net_file.to_path_buf(),
            source,
        })?;
        let sumo_net = Self::from_reader(BufReader::new(file))?;
        info!(
            "Read {} edges and {} connections from {}",
            sumo_net.edges.len(),
            sumo_net.connections.len(),
            net_file.display()
        );
        Ok(sumo_net)
    }

    pub fn from_reader<R: BufRead>(input: R) -> Result<Self, NetError> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);

        let mut sumo_net = SumoNet::default();
        let mut buffer = Vec::new();
        loop {
            match reader.read_event_into(&mut buffer)? {
                Event::Start(tag) | Event::Empty(tag) => {
                    let position = reader.buffer_position();
                    match tag.name().as_ref() {
                        EDGE_TAG => sumo_net.read_edge(&tag, position)?,
                        CONNECTION_TAG => sumo_net.read_connection(&tag, position)?,
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buffer.clear();
        }
        Ok(sumo_net)
    }

    fn read_edge(&mut self, edge_tag: &BytesStart, position: u64) -> Result<(), NetError> {
        let edge = EdgeId::from(required_attribute(edge_tag, "edge", "id", position)?);
        if edge.is_internal() {
            return Ok(());
        }
        self.edges.push(edge);
        Ok(())
    }

    fn read_connection(&mut self, tag: &BytesStart, position: u64) -> Result<(), NetError> {
        let from = EdgeId::from(required_attribute(tag, "connection", "from", position)?);
        let to = EdgeId::from(required_attribute(tag, "connection", "to", position)?);
        if from.is_internal() || to.is_internal() {
            return Ok(());
        }
        self.connections.push((from, to));
        Ok(())
    }

    /// Non-internal edges in the order the network declares them.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn reachable(&self, edge: &EdgeId) -> NextEdges {
        self.connections
            .iter()
            .filter(|(from, _)| from == edge)
            .map(|(_, to)| to.clone())
            .collect()
    }

    pub fn adjacency(&self) -> Adjacency {
        let mut next_edges: IndexMap<EdgeId, NextEdges> = self
            .edges
            .iter()
            .map(|edge| (edge.clone(), NextEdges::new()))
            .collect();
        for (from, to) in self.connections.iter() {
            match next_edges.get_mut(from) {
                Some(targets) => targets.push(to.clone()),
                None => debug!("Skipping connection from unknown edge {}", from),
            }
        }
        Adjacency { next_edges }
    }
}

/// Reads the edges reachable from `edge` straight from the network file, without
/// building the whole graph.
pub fn reachable_from(net_file: &Path, edge: &EdgeId) -> Result<NextEdges, NetError> {
    let file = File::open(net_file).map_err(|source| NetError::Open {
        path: net_file.to_path_buf(),
        source,
    })?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);

    let mut next_edges = NextEdges::new();
    let mut buffer = Vec::new();
    loop {
        match reader.read_event_into(&mut buffer)? {
            Event::Start(tag) | Event::Empty(tag) if tag.name().as_ref() == CONNECTION_TAG => {
                let position = reader.buffer_position();
                let from = required_attribute(&tag, "connection", "from", position)?;
                if edge == from.as_str() {
                    let to = EdgeId::from(required_attribute(&tag, "connection", "to", position)?);
                    if !to.is_internal() {
                        next_edges.push(to);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }
    Ok(next_edges)
}

fn required_attribute(
    tag: &BytesStart,
    tag_name: &'static str,
    attribute: &'static str,
    position: u64,
) -> Result<String, NetError> {
    match tag.try_get_attribute(attribute)? {
        Some(value) => Ok(value.unescape_value()?.into_owned()),
        None => Err(NetError::MissingAttribute {
            tag: tag_name,
            attribute,
            position,
        }),
    }
}
