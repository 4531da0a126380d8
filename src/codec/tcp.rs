use crate::codec::fields;
use crate::error::{ModbusError, ModbusResult};
use crate::messages::{ModbusMessage, ModbusPdu};
use crate::protocol::{
    ProtocolDefinition, FUNCTION_CODE, LENGTH_FIELD, PROTOCOL_IDENTIFIER, TRANSACTION_IDENTIFIER,
    UNIT_IDENTIFIER,
};
use crate::validator;

use std::io::Cursor;
use tracing::debug;

/// MBAP header plus at least the function code byte
const MIN_FRAME_LEN: usize = 8;

/// Bytes of the frame the length field does not count
/// (transaction id, protocol id and the length field itself)
const LENGTH_FIELD_OFFSET: usize = 6;

pub fn encode_frame(
    protocol: &ProtocolDefinition,
    message: &ModbusMessage,
) -> ModbusResult<Vec<u8>> {
    let pdu_bytes = message.pdu.to_bytes();

    // The unit identifier byte is counted together with the pdu
    let length = pdu_bytes.len() + 1;
    if length > usize::from(u16::MAX) {
        return Err(ModbusError::FieldValueOutOfRange {
            field: LENGTH_FIELD.to_string(),
            value: u16::MAX,
        });
    }

    let mut result = Vec::with_capacity(LENGTH_FIELD_OFFSET + length);

    for field in protocol.header_fields() {
        let supplied = match field.name.as_str() {
            TRANSACTION_IDENTIFIER => Some(message.transaction_id),
            LENGTH_FIELD => Some(length as u16),
            UNIT_IDENTIFIER => Some(u16::from(message.unit_id)),
            // First byte of the pdu
            FUNCTION_CODE => continue,
            _ => None,
        };
        fields::encode_field(field, supplied, &mut result)?;
    }

    result.extend_from_slice(&pdu_bytes);

    debug!(
        "encoded frame: transaction={:#06X} unit={} fc={:#04X} len={}",
        message.transaction_id,
        message.unit_id,
        message.pdu.function_code(),
        result.len()
    );

    Ok(result)
}

pub fn decode_frame(protocol: &ProtocolDefinition, data: &[u8]) -> ModbusResult<ModbusMessage> {
    if data.len() < MIN_FRAME_LEN {
        return Err(ModbusError::TruncatedFrame {
            expected: MIN_FRAME_LEN,
            actual: data.len(),
        });
    }

    let mut cursor = Cursor::new(data);

    let mut transaction_id = 0u16;
    let mut unit_id = 0u8;
    let mut declared_length = 0u16;
    let mut function_code = 0u8;

    for field in protocol.header_fields() {
        let value = fields::decode_field(field, &mut cursor)?;

        match field.name.as_str() {
            TRANSACTION_IDENTIFIER => transaction_id = value,
            PROTOCOL_IDENTIFIER => validator::check_protocol_id(value)?,
            LENGTH_FIELD => declared_length = value,
            UNIT_IDENTIFIER => unit_id = value as u8,
            FUNCTION_CODE => function_code = value as u8,
            _ => {}
        }
    }

    // The length field counts every byte from the unit identifier on
    let actual_length = data.len() - LENGTH_FIELD_OFFSET;
    if usize::from(declared_length) != actual_length {
        return Err(ModbusError::LengthMismatch {
            declared: declared_length,
            actual: actual_length,
        });
    }

    let payload = data[cursor.position() as usize..].to_vec();
    let pdu = ModbusPdu::from_parts(function_code, payload);
    validator::validate_pdu(&pdu)?;

    debug!(
        "decoded frame: transaction={:#06X} unit={} fc={:#04X} payload_len={}",
        transaction_id,
        unit_id,
        pdu.function_code(),
        pdu.payload().len()
    );

    Ok(ModbusMessage::new(transaction_id, unit_id, pdu))
}

/// Convenience wrappers over the canonical Modbus TCP/IP schema
pub fn encode(message: &ModbusMessage) -> ModbusResult<Vec<u8>> {
    encode_frame(&ProtocolDefinition::modbus_tcp(), message)
}

pub fn decode(data: &[u8]) -> ModbusResult<ModbusMessage> {
    decode_frame(&ProtocolDefinition::modbus_tcp(), data)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::PROTOCOL_ID;
    use crate::messages::FunctionCode;

    fn fc1_message() -> ModbusMessage {
        ModbusMessage::new(
            0x0001,
            0x01,
            ModbusPdu::read_coils_request(0x0000, 0x000A),
        )
    }

    #[test]
    fn test_encode_fc1_request_frame() {
        let bytes = encode(&fc1_message()).unwrap();

        assert_eq!(
            bytes,
            vec![0x00, 0x01, 0x00, 0x01, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x0A]
        );
    }

    #[test]
    fn test_round_trip() {
        let message = fc1_message();
        let bytes = encode(&message).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn test_round_trip_write_single_register() {
        let message = ModbusMessage::new(
            0x1234,
            0x11,
            ModbusPdu::write_single_register_request(0x006B, 0x0203).unwrap(),
        );
        let bytes = encode(&message).unwrap();

        assert_eq!(
            bytes,
            vec![0x12, 0x34, 0x00, 0x01, 0x00, 0x06, 0x11, 0x06, 0x00, 0x6B, 0x02, 0x03]
        );
        assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_decode_short_frame_is_truncated() {
        let bytes = encode(&fc1_message()).unwrap();

        for len in 0..MIN_FRAME_LEN {
            let result = decode(&bytes[..len]);
            assert_eq!(
                result,
                Err(ModbusError::TruncatedFrame {
                    expected: MIN_FRAME_LEN,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_decode_rejects_wrong_protocol_id() {
        let mut bytes = encode(&fc1_message()).unwrap();
        bytes[2] = 0x00;
        bytes[3] = 0x00;

        assert_eq!(
            decode(&bytes),
            Err(ModbusError::ProtocolIdMismatch { got: 0 })
        );
    }

    #[test]
    fn test_decode_rejects_wrong_length_field() {
        let mut bytes = encode(&fc1_message()).unwrap();
        bytes[5] = 0x07;

        assert_eq!(
            decode(&bytes),
            Err(ModbusError::LengthMismatch {
                declared: 7,
                actual: 6
            })
        );
    }

    #[test]
    fn test_decode_rejects_trailing_garbage() {
        let mut bytes = encode(&fc1_message()).unwrap();
        bytes.push(0xFF);

        assert_eq!(
            decode(&bytes),
            Err(ModbusError::LengthMismatch {
                declared: 6,
                actual: 7
            })
        );
    }

    #[test]
    fn test_decode_accepts_unmodeled_function_code() {
        // FC43 (Read Device Identification) is not modeled by the engine
        // but captured frames carrying it must still decode
        let bytes = vec![0x00, 0x01, 0x00, 0x01, 0x00, 0x05, 0x01, 0x2B, 0x0E, 0x01, 0x00];

        let message = decode(&bytes).unwrap();
        assert_eq!(message.pdu.function_code(), 0x2B);
        assert_eq!(message.pdu.function(), None);
        assert_eq!(message.pdu.payload(), &[0x0E, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_traverses_schema_order() {
        let protocol = ProtocolDefinition::modbus_tcp();
        let message = fc1_message();
        let bytes = encode_frame(&protocol, &message).unwrap();

        assert_eq!(&bytes[0..2], &message.transaction_id.to_be_bytes());
        assert_eq!(&bytes[2..4], &PROTOCOL_ID.to_be_bytes());
        assert_eq!(&bytes[4..6], &[0x00, 0x06]);
        assert_eq!(bytes[6], message.unit_id);
        assert_eq!(bytes[7], FunctionCode::ReadCoils as u8);
    }
}
