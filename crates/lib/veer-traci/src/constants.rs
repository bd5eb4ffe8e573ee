// Command, variable and type identifiers of the TraCI protocol.

pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7F;

pub const CMD_GET_LANE_VARIABLE: u8 = 0xa3;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xab;
pub const CMD_SET_VEHICLE_VARIABLE: u8 = 0xc4;
pub const CMD_SET_ROUTE_VARIABLE: u8 = 0xc6;

/// Responses to get commands carry the command id plus this offset.
pub const RESPONSE_OFFSET: u8 = 0x10;

pub const VAR_LANE_ID: u8 = 0x51;
pub const LANE_EDGE_ID: u8 = 0x31;
pub const VAR_MIN_EXPECTED_VEHICLES: u8 = 0x7d;
pub const CMD_CHANGETARGET: u8 = 0x31;
pub const ADD: u8 = 0x80;
pub const ADD_FULL: u8 = 0x85;

pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xFF;

pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_STRING: u8 = 0x0C;
pub const TYPE_STRINGLIST: u8 = 0x0E;
pub const TYPE_COMPOUND: u8 = 0x0F;
