use std::io::{Read, Write};

use veer_core::edge::{EdgeId, LaneId};

use crate::client::TraciClient;
use crate::error::TraciError;

/// The operations the router needs from a running simulation.
pub trait TrafficControl {
    fn add_route(&mut self, route_id: &str, edges: &[EdgeId]) -> Result<(), TraciError>;
    fn add_vehicle(&mut self, vehicle_id: &str, route_id: &str) -> Result<(), TraciError>;
    fn simulation_step(&mut self) -> Result<(), TraciError>;
    fn vehicle_lane(&mut self, vehicle_id: &str) -> Result<LaneId, TraciError>;
    fn lane_edge(&mut self, lane: &LaneId) -> Result<EdgeId, TraciError>;
    fn change_target(&mut self, vehicle_id: &str, edge: &EdgeId) -> Result<(), TraciError>;
    fn min_expected_vehicles(&mut self) -> Result<i32, TraciError>;
    /// Ends the simulation and releases everything held for it.
    fn close(self) -> Result<(), TraciError>;
}

/// Starts a fresh simulation for every episode.
pub trait Launch {
    type Control: TrafficControl;

    fn launch(&mut self) -> Result<Self::Control, TraciError>;
}

impl<S: Read + Write> TrafficControl for TraciClient<S> {
    fn add_route(&mut self, route_id: &str, edges: &[EdgeId]) -> Result<(), TraciError> {
        TraciClient::add_route(self, route_id, edges)
    }

    fn add_vehicle(&mut self, vehicle_id: &str, route_id: &str) -> Result<(), TraciError> {
        TraciClient::add_vehicle(self, vehicle_id, route_id)
    }

    fn simulation_step(&mut self) -> Result<(), TraciError> {
        TraciClient::simulation_step(self)
    }

    fn vehicle_lane(&mut self, vehicle_id: &str) -> Result<LaneId, TraciError> {
        TraciClient::vehicle_lane(self, vehicle_id)
    }

    fn lane_edge(&mut self, lane: &LaneId) -> Result<EdgeId, TraciError> {
        TraciClient::lane_edge(self, lane)
    }

    fn change_target(&mut self, vehicle_id: &str, edge: &EdgeId) -> Result<(), TraciError> {
        TraciClient::change_target(self, vehicle_id, edge)
    }

    fn min_expected_vehicles(&mut self) -> Result<i32, TraciError> {
        TraciClient::min_expected_vehicles(self)
    }

    fn close(mut self) -> Result<(), TraciError> {
        TraciClient::close(&mut self)
    }
}
