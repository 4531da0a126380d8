use crate::common::{ModbusDataType, ModbusTable, PROTOCOL_ID};
use crate::error::{ModbusError, ModbusResult};
use crate::messages::{FunctionCode, ModbusPdu};

/// Payload size of every fixed-shape request: two u16 parameters
const FIXED_REQUEST_PAYLOAD_LEN: usize = 4;

/// Payload prefix of the multiple-write requests:
/// starting address, quantity, byte count
const MULTI_WRITE_PREFIX_LEN: usize = 5;

pub fn check_protocol_id(got: u16) -> ModbusResult<()> {
    if got != PROTOCOL_ID {
        return Err(ModbusError::ProtocolIdMismatch { got });
    }
    Ok(())
}

/// Check a pdu against the payload rules of its function code
///
/// Codes the engine does not model pass untouched. Nothing is corrected;
/// the input is never mutated.
pub fn validate_pdu(pdu: &ModbusPdu) -> ModbusResult<()> {
    let Some(function) = pdu.function() else {
        return Ok(());
    };

    let payload = pdu.payload();

    match function {
        FunctionCode::ReadCoils
        | FunctionCode::ReadDiscreteInputs
        | FunctionCode::ReadHoldingRegisters
        | FunctionCode::ReadInputRegisters
        | FunctionCode::WriteSingleRegister => {
            expect_payload_len(function, payload, FIXED_REQUEST_PAYLOAD_LEN)
        }
        FunctionCode::WriteSingleCoil => {
            expect_payload_len(function, payload, FIXED_REQUEST_PAYLOAD_LEN)?;

            let value = u16::from_be_bytes([payload[2], payload[3]]);
            ModbusDataType::coil_from_representation(value)?;
            Ok(())
        }
        FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
            if payload.len() < MULTI_WRITE_PREFIX_LEN {
                return Err(ModbusError::PayloadShapeMismatch {
                    function_code: function as u8,
                    expected: MULTI_WRITE_PREFIX_LEN,
                    actual: payload.len(),
                });
            }

            let quantity = u16::from_be_bytes([payload[2], payload[3]]);
            let byte_count = usize::from(payload[4]);

            let table = ModbusTable::get_table_from_function_code(function);
            let expected_values = expected_value_byte_count(table, quantity);
            let expected_total = MULTI_WRITE_PREFIX_LEN + expected_values;

            if byte_count != expected_values || payload.len() != expected_total {
                return Err(ModbusError::PayloadShapeMismatch {
                    function_code: function as u8,
                    expected: expected_total,
                    actual: payload.len(),
                });
            }
            Ok(())
        }
    }
}

fn expect_payload_len(
    function: FunctionCode,
    payload: &[u8],
    expected: usize,
) -> ModbusResult<()> {
    if payload.len() != expected {
        return Err(ModbusError::PayloadShapeMismatch {
            function_code: function as u8,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn expected_value_byte_count(table: ModbusTable, amount: u16) -> usize {
    let amount = usize::from(amount);
    match table {
        ModbusTable::Coils | ModbusTable::DiscreteInput => {
            if amount % 8 == 0 {
                amount / 8
            } else {
                amount / 8 + 1
            }
        }
        ModbusTable::InputRegisters | ModbusTable::HoldingRegisters => amount * 2,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::messages::pack_coils;

    #[test]
    fn test_protocol_id_constant() {
        assert!(check_protocol_id(PROTOCOL_ID).is_ok());
        assert_eq!(
            check_protocol_id(0),
            Err(ModbusError::ProtocolIdMismatch { got: 0 })
        );
    }

    #[test]
    fn test_read_request_shape() {
        let valid = ModbusPdu::read_coils_request(0x0000, 0x000A);
        assert!(validate_pdu(&valid).is_ok());

        let short = ModbusPdu::from_parts(FunctionCode::ReadCoils as u8, vec![0x00, 0x00]);
        assert_eq!(
            validate_pdu(&short),
            Err(ModbusError::PayloadShapeMismatch {
                function_code: 0x01,
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_write_single_coil_domain_rechecked() {
        let tampered =
            ModbusPdu::from_parts(FunctionCode::WriteSingleCoil as u8, vec![0x00, 0xAC, 0x12, 0x34]);

        assert_eq!(
            validate_pdu(&tampered),
            Err(ModbusError::InvalidCoilValue { value: 0x1234 })
        );
    }

    #[test]
    fn test_multi_coil_byte_count() {
        let coils = [true, false, true, true, false, false, true, false, true];

        let mut payload = vec![0x00, 0x13, 0x00, 0x09];
        let packed = pack_coils(&coils);
        payload.push(packed.len() as u8);
        payload.extend_from_slice(&packed);

        let valid = ModbusPdu::from_parts(FunctionCode::WriteMultipleCoils as u8, payload.clone());
        assert!(validate_pdu(&valid).is_ok());

        // Declared byte count disagreeing with the quantity
        payload[4] = 3;
        let wrong = ModbusPdu::from_parts(FunctionCode::WriteMultipleCoils as u8, payload);
        assert!(matches!(
            validate_pdu(&wrong),
            Err(ModbusError::PayloadShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_multi_register_byte_count() {
        // quantity 2 -> 4 value bytes
        let payload = vec![0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02];
        let valid = ModbusPdu::from_parts(FunctionCode::WriteMultipleRegisters as u8, payload);
        assert!(validate_pdu(&valid).is_ok());

        let truncated =
            ModbusPdu::from_parts(FunctionCode::WriteMultipleRegisters as u8, vec![0x00, 0x01]);
        assert!(matches!(
            validate_pdu(&truncated),
            Err(ModbusError::PayloadShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unmodeled_code_passes() {
        let pdu = ModbusPdu::from_parts(0x2B, vec![0x0E]);
        assert!(validate_pdu(&pdu).is_ok());
    }
}
