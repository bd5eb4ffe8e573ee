use std::io::{Read, Write};

use log::{debug, trace};

use veer_core::edge::{EdgeId, LaneId};

use crate::constants::*;
use crate::error::TraciError;
use crate::storage::{Storage, StorageWriter};

const DEFAULT_VEHICLE_TYPE: &str = "DEFAULT_VEHTYPE";

/// A TraCI connection over any byte stream. The stream is a TCP socket in
/// production and an in-memory pipe in tests.
pub struct TraciClient<S: Read + Write> {
    stream: S,
}

impl<S: Read + Write> TraciClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn version(&mut self) -> Result<(i32, String), TraciError> {
        let mut response = self.exchange(CMD_GETVERSION, &[])?;
        response.read_command_length()?;
        let command = response.read_u8()?;
        if command != CMD_GETVERSION {
            return Err(TraciError::Protocol(format!(
                "expected version response, found command 0x{:02x}",
                command
            )));
        }
        let api_version = response.read_i32()?;
        let sumo_version = response.read_string()?;
        Ok((api_version, sumo_version))
    }

    /// Advances the simulation by exactly one step.
    pub fn simulation_step(&mut self) -> Result<(), TraciError> {
        let mut content = StorageWriter::new();
        content.write_f64(0.0);
        let mut response = self.exchange(CMD_SIMSTEP, &content.into_bytes())?;
        let subscriptions = response.read_i32()?;
        if subscriptions > 0 {
            debug!("Ignoring {} subscription results", subscriptions);
        }
        Ok(())
    }

    pub fn add_route(&mut self, route_id: &str, edges: &[EdgeId]) -> Result<(), TraciError> {
        let edge_ids: Vec<&str> = edges.iter().map(|edge| edge.as_str()).collect();
        let mut content = StorageWriter::new();
        content
            .write_u8(ADD)
            .write_string(route_id)
            .write_typed_string_list(&edge_ids);
        self.exchange(CMD_SET_ROUTE_VARIABLE, &content.into_bytes())?;
        Ok(())
    }

    /// Adds a vehicle of the default type that departs now on `route_id`.
    pub fn add_vehicle(&mut self, vehicle_id: &str, route_id: &str) -> Result<(), TraciError> {
        let mut content = StorageWriter::new();
        content
            .write_u8(ADD_FULL)
            .write_string(vehicle_id)
            .write_compound_header(14)
            .write_typed_string(route_id)
            .write_typed_string(DEFAULT_VEHICLE_TYPE)
            .write_typed_string("now")
            .write_typed_string("first")
            .write_typed_string("base")
            .write_typed_string("0")
            .write_typed_string("current")
            .write_typed_string("max")
            .write_typed_string("current")
            .write_typed_string("")
            .write_typed_string("")
            .write_typed_string("")
            .write_typed_int(0)
            .write_typed_int(0);
        self.exchange(CMD_SET_VEHICLE_VARIABLE, &content.into_bytes())?;
        Ok(())
    }

    pub fn vehicle_lane(&mut self, vehicle_id: &str) -> Result<LaneId, TraciError> {
        let mut response = self.get(CMD_GET_VEHICLE_VARIABLE, VAR_LANE_ID, vehicle_id)?;
        response.expect_type(TYPE_STRING)?;
        Ok(LaneId::new(response.read_string()?))
    }

    pub fn lane_edge(&mut self, lane: &LaneId) -> Result<EdgeId, TraciError> {
        let mut response = self.get(CMD_GET_LANE_VARIABLE, LANE_EDGE_ID, lane.as_str())?;
        response.expect_type(TYPE_STRING)?;
        Ok(EdgeId::new(response.read_string()?))
    }

    /// Makes `edge` the new destination; the simulator reroutes the vehicle to it.
    pub fn change_target(&mut self, vehicle_id: &str, edge: &EdgeId) -> Result<(), TraciError> {
        let mut content = StorageWriter::new();
        content
            .write_u8(CMD_CHANGETARGET)
            .write_string(vehicle_id)
            .write_typed_string(edge.as_str());
        self.exchange(CMD_SET_VEHICLE_VARIABLE, &content.into_bytes())?;
        Ok(())
    }

    /// Vehicles that are running or still waiting to be inserted.
    pub fn min_expected_vehicles(&mut self) -> Result<i32, TraciError> {
        let mut response = self.get(CMD_GET_SIM_VARIABLE, VAR_MIN_EXPECTED_VEHICLES, "")?;
        response.expect_type(TYPE_INTEGER)?;
        response.read_i32()
    }

    pub fn close(&mut self) -> Result<(), TraciError> {
        self.exchange(CMD_CLOSE, &[])?;
        Ok(())
    }

    fn get(&mut self, command: u8, variable: u8, object_id: &str) -> Result<Storage, TraciError> {
        let mut content = StorageWriter::new();
        content.write_u8(variable).write_string(object_id);
        let mut response = self.exchange(command, &content.into_bytes())?;

        response.read_command_length()?;
        let response_id = response.read_u8()?;
        let response_variable = response.read_u8()?;
        let response_object = response.read_string()?;
        if response_id != command + RESPONSE_OFFSET
            || response_variable != variable
            || response_object != object_id
        {
            return Err(TraciError::Protocol(format!(
                "response 0x{:02x}/0x{:02x}/{} does not match request 0x{:02x}/0x{:02x}/{}",
                response_id, response_variable, response_object, command, variable, object_id
            )));
        }
        Ok(response)
    }

    /// Sends a single command and returns the response positioned after its status.
    fn exchange(&mut self, command: u8, content: &[u8]) -> Result<Storage, TraciError> {
        let framed = frame_command(command, content);
        let mut message = StorageWriter::new();
        message.write_i32(message_length(framed.len())?);
        let mut message = message.into_bytes();
        message.extend_from_slice(&framed);
        trace!("Sending command 0x{:02x} ({} bytes)", command, message.len());
        self.stream.write_all(&message)?;
        self.stream.flush()?;

        let mut response = self.receive()?;
        read_status(&mut response, command)?;
        Ok(response)
    }

    fn receive(&mut self) -> Result<Storage, TraciError> {
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;
        let total = i32::from_be_bytes(header);
        let body_len = usize::try_from(total)
            .ok()
            .and_then(|total| total.checked_sub(4))
            .ok_or_else(|| TraciError::Protocol(format!("invalid message length {}", total)))?;
        let mut body = vec![0u8; body_len];
        self.stream.read_exact(&mut body)?;
        Ok(Storage::new(body))
    }
}

pub(crate) fn frame_command(command: u8, content: &[u8]) -> Vec<u8> {
    let short_len = content.len() + 2;
    let mut framed = Vec::with_capacity(content.len() + 6);
    match u8::try_from(short_len) {
        Ok(len) => framed.push(len),
        Err(_) => {
            framed.push(0);
            let long_len = (content.len() + 6) as i32;
            framed.extend_from_slice(&long_len.to_be_bytes());
        }
    }
    framed.push(command);
    framed.extend_from_slice(content);
    framed
}

fn message_length(framed_len: usize) -> Result<i32, TraciError> {
    i32::try_from(framed_len + 4)
        .map_err(|_| TraciError::Protocol(format!("message of {} bytes is too long", framed_len)))
}

fn read_status(response: &mut Storage, command: u8) -> Result<(), TraciError> {
    response.read_command_length()?;
    let status_command = response.read_u8()?;
    let result = response.read_u8()?;
    let message = response.read_string()?;
    if status_command != command {
        return Err(TraciError::Protocol(format!(
            "status for command 0x{:02x} received while waiting for 0x{:02x}",
            status_command, command
        )));
    }
    match result {
        RTYPE_OK => Ok(()),
        RTYPE_ERR => Err(TraciError::CommandFailed { command, message }),
        RTYPE_NOTIMPLEMENTED => Err(TraciError::NotImplemented { command, message }),
        other => Err(TraciError::Protocol(format!(
            "unknown result type 0x{:02x} for command 0x{:02x}",
            other, command
        ))),
    }
}
