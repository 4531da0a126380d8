use crate::error::{ModbusError, ModbusResult};
use crate::messages::FunctionCode;

/// Registered TCP port for Modbus TCP/IP, published for the transport layer
pub const MODBUS_PORT: u16 = 502;

/// Protocol identifier for Modbus TCP/IP v1.1b (NOT "Modbus over TCP/IP")
pub const PROTOCOL_ID: u16 = 1;

/// The length field counts the unit identifier and function code bytes
/// in addition to the payload
pub const PDU_OFFSET: u16 = 2;

pub const COIL_ON: u16 = 0xFF00;
pub const COIL_OFF: u16 = 0x0000;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ModbusDataType {
    Coil(bool),
    Register(u16),
}

impl ModbusDataType {
    pub fn get_representation(&self) -> u16 {
        match self {
            ModbusDataType::Coil(value) => {
                if *value {
                    COIL_ON
                } else {
                    COIL_OFF
                }
            }
            ModbusDataType::Register(value) => *value,
        }
    }

    pub fn coil_from_representation(raw_value: u16) -> ModbusResult<Self> {
        match raw_value {
            COIL_ON => Ok(ModbusDataType::Coil(true)),
            COIL_OFF => Ok(ModbusDataType::Coil(false)),
            _ => Err(ModbusError::InvalidCoilValue { value: raw_value }),
        }
    }

    pub fn register_from_raw(raw_value: u32) -> ModbusResult<Self> {
        if raw_value > u32::from(u16::MAX) {
            return Err(ModbusError::RegisterValueOutOfRange { value: raw_value });
        }
        Ok(ModbusDataType::Register(raw_value as u16))
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum ModbusTable {
    DiscreteInput,
    Coils,
    InputRegisters,
    HoldingRegisters,
}

impl ModbusTable {
    pub fn get_table_from_function_code(function_code: FunctionCode) -> ModbusTable {
        match function_code {
            FunctionCode::ReadCoils
            | FunctionCode::WriteSingleCoil
            | FunctionCode::WriteMultipleCoils => ModbusTable::Coils,
            FunctionCode::ReadDiscreteInputs => ModbusTable::DiscreteInput,
            FunctionCode::ReadInputRegisters => ModbusTable::InputRegisters,
            FunctionCode::ReadHoldingRegisters
            | FunctionCode::WriteSingleRegister
            | FunctionCode::WriteMultipleRegisters => ModbusTable::HoldingRegisters,
        }
    }
}
