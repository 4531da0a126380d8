use crate::codec;
use crate::common::ModbusDataType;
use crate::error::ModbusResult;

use num_enum::TryFromPrimitive;

/// Function codes this engine models
///
/// RTU-only codes are out of scope together with the serial subprotocol.
#[derive(Clone, Copy, PartialEq, Eq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 1,
    ReadDiscreteInputs = 2,
    ReadHoldingRegisters = 3,
    ReadInputRegisters = 4,
    WriteSingleCoil = 5,
    WriteSingleRegister = 6,
    WriteMultipleCoils = 15,
    WriteMultipleRegisters = 16,
}

/// Protocol Data Unit: function code byte plus function-specific payload
#[derive(Clone, PartialEq, Debug)]
pub struct ModbusPdu {
    function_code: u8,
    payload: Vec<u8>,
}

impl ModbusPdu {
    pub fn from_parts(function_code: u8, payload: Vec<u8>) -> Self {
        ModbusPdu {
            function_code,
            payload,
        }
    }

    pub fn function_code(&self) -> u8 {
        self.function_code
    }

    /// The modeled function, if this engine models the code
    pub fn function(&self) -> Option<FunctionCode> {
        FunctionCode::try_from(self.function_code).ok()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1 + self.payload.len());
        codec::encode_u8(self.function_code, &mut result);
        result.extend_from_slice(&self.payload);
        result
    }

    fn read_request(function_code: FunctionCode, starting_address: u16, quantity: u16) -> Self {
        let mut payload = Vec::new();
        codec::encode_u16(starting_address, &mut payload);
        codec::encode_u16(quantity, &mut payload);

        ModbusPdu {
            function_code: function_code as u8,
            payload,
        }
    }

    pub fn read_coils_request(starting_address: u16, quantity_of_coils: u16) -> Self {
        Self::read_request(FunctionCode::ReadCoils, starting_address, quantity_of_coils)
    }

    pub fn read_discrete_inputs_request(starting_address: u16, quantity: u16) -> Self {
        Self::read_request(FunctionCode::ReadDiscreteInputs, starting_address, quantity)
    }

    pub fn read_holding_registers_request(starting_address: u16, quantity: u16) -> Self {
        Self::read_request(FunctionCode::ReadHoldingRegisters, starting_address, quantity)
    }

    pub fn read_input_registers_request(starting_address: u16, quantity: u16) -> Self {
        Self::read_request(FunctionCode::ReadInputRegisters, starting_address, quantity)
    }

    pub fn write_single_coil_request(address: u16, value: u16) -> ModbusResult<Self> {
        let value = ModbusDataType::coil_from_representation(value)?;

        let mut payload = Vec::new();
        codec::encode_u16(address, &mut payload);
        codec::encode_u16(value.get_representation(), &mut payload);

        Ok(ModbusPdu {
            function_code: FunctionCode::WriteSingleCoil as u8,
            payload,
        })
    }

    pub fn write_single_register_request(address: u16, value: u32) -> ModbusResult<Self> {
        let value = ModbusDataType::register_from_raw(value)?;

        let mut payload = Vec::new();
        codec::encode_u16(address, &mut payload);
        codec::encode_u16(value.get_representation(), &mut payload);

        Ok(ModbusPdu {
            function_code: FunctionCode::WriteSingleRegister as u8,
            payload,
        })
    }
}

/// Pack coil states into bitmap bytes, bit0 of each byte being the first
/// coil of its group of eight
pub fn pack_coils(values: &[bool]) -> Vec<u8> {
    let byte_count = if values.len() % 8 == 0 {
        values.len() / 8
    } else {
        values.len() / 8 + 1
    };

    let mut result = vec![0u8; byte_count];
    for (index, value) in values.iter().enumerate() {
        if *value {
            result[index / 8] |= 1 << (index % 8);
        }
    }
    result
}

/// A fully-resolved message, ready for encoding or produced by decoding
#[derive(Clone, PartialEq, Debug)]
pub struct ModbusMessage {
    pub transaction_id: u16,
    pub unit_id: u8,
    pub pdu: ModbusPdu,
}

impl ModbusMessage {
    pub fn new(transaction_id: u16, unit_id: u8, pdu: ModbusPdu) -> Self {
        ModbusMessage {
            transaction_id,
            unit_id,
            pdu,
        }
    }

    pub fn encode(&self) -> ModbusResult<Vec<u8>> {
        codec::encode(self)
    }

    pub fn decode(data: &[u8]) -> ModbusResult<Self> {
        codec::decode(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ModbusError;

    #[test]
    fn test_read_coils_request_bytes() {
        let pdu = ModbusPdu::read_coils_request(0x0000, 0x000A);

        assert_eq!(pdu.function(), Some(FunctionCode::ReadCoils));
        assert_eq!(pdu.to_bytes(), vec![0x01, 0x00, 0x00, 0x00, 0x0A]);
    }

    #[test]
    fn test_read_request_families_share_payload_shape() {
        let holding = ModbusPdu::read_holding_registers_request(0x006B, 0x0003);
        assert_eq!(holding.to_bytes(), vec![0x03, 0x00, 0x6B, 0x00, 0x03]);

        let discrete = ModbusPdu::read_discrete_inputs_request(0x0100, 0x0010);
        assert_eq!(discrete.to_bytes(), vec![0x02, 0x01, 0x00, 0x00, 0x10]);

        let input = ModbusPdu::read_input_registers_request(0x0008, 0x0001);
        assert_eq!(input.to_bytes(), vec![0x04, 0x00, 0x08, 0x00, 0x01]);
    }

    #[test]
    fn test_write_single_coil_domain() {
        let on = ModbusPdu::write_single_coil_request(0x00AC, 0xFF00).unwrap();
        assert_eq!(on.to_bytes(), vec![0x05, 0x00, 0xAC, 0xFF, 0x00]);

        let off = ModbusPdu::write_single_coil_request(0x00AC, 0x0000).unwrap();
        assert_eq!(off.to_bytes(), vec![0x05, 0x00, 0xAC, 0x00, 0x00]);

        assert_eq!(
            ModbusPdu::write_single_coil_request(0x00AC, 0x0001),
            Err(ModbusError::InvalidCoilValue { value: 0x0001 })
        );
    }

    #[test]
    fn test_write_single_register_range() {
        let pdu = ModbusPdu::write_single_register_request(0x0001, 0x0003).unwrap();
        assert_eq!(pdu.to_bytes(), vec![0x06, 0x00, 0x01, 0x00, 0x03]);

        assert_eq!(
            ModbusPdu::write_single_register_request(0x0001, 70000),
            Err(ModbusError::RegisterValueOutOfRange { value: 70000 })
        );
    }

    #[test]
    fn test_pack_coils_bit_order() {
        // bit0 = first coil of the group
        assert_eq!(pack_coils(&[true, false, true]), vec![0b0000_0101]);
        assert_eq!(
            pack_coils(&[true, true, false, false, true, true, false, true]),
            vec![0b1011_0011]
        );
    }

    #[test]
    fn test_pack_coils_group_boundaries() {
        assert_eq!(pack_coils(&[]), Vec::<u8>::new());
        assert_eq!(pack_coils(&[false; 8]), vec![0x00]);

        let mut ten = vec![false; 10];
        ten[8] = true;
        assert_eq!(pack_coils(&ten), vec![0x00, 0x01]);
    }

    #[test]
    fn test_unmodeled_function_code() {
        let pdu = ModbusPdu::from_parts(0x2B, vec![0x0E, 0x01, 0x00]);
        assert_eq!(pdu.function(), None);
        assert_eq!(pdu.function_code(), 0x2B);
    }
}
