use crate::error::{ModbusError, ModbusResult};
use crate::protocol::{FieldSpec, FieldWidth};

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

pub fn remaining(data: &Cursor<&[u8]>) -> usize {
    data.get_ref().len() - data.position() as usize
}

pub fn encode_u8(value: u8, out: &mut Vec<u8>) {
    out.push(value);
}

pub fn encode_u16(value: u16, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn decode_u8(data: &mut Cursor<&[u8]>) -> ModbusResult<u8> {
    let actual = remaining(data);
    data.read_u8().map_err(|_| ModbusError::TruncatedFrame {
        expected: 1,
        actual,
    })
}

pub fn decode_u16(data: &mut Cursor<&[u8]>) -> ModbusResult<u16> {
    let actual = remaining(data);
    data.read_u16::<BigEndian>()
        .map_err(|_| ModbusError::TruncatedFrame {
            expected: 2,
            actual,
        })
}

/// Merge a caller-supplied value with the field's fixed value
///
/// A fixed field resolves to its fixed value; a supplied value for it must
/// match. A placeholder field must be supplied. The resolved value must fit
/// the declared width.
pub fn resolve_field_value(spec: &FieldSpec, supplied: Option<u16>) -> ModbusResult<u16> {
    let value = match (spec.fixed, supplied) {
        (Some(fixed), Some(got)) if got != fixed => {
            return Err(ModbusError::FieldValueMismatch {
                field: spec.name.clone(),
                expected: fixed,
                got,
            })
        }
        (Some(fixed), _) => fixed,
        (None, Some(got)) => got,
        (None, None) => {
            return Err(ModbusError::MissingField {
                field: spec.name.clone(),
            })
        }
    };

    if value > spec.width.max_value() {
        return Err(ModbusError::FieldValueOutOfRange {
            field: spec.name.clone(),
            value,
        });
    }

    Ok(value)
}

pub fn encode_field(
    spec: &FieldSpec,
    supplied: Option<u16>,
    out: &mut Vec<u8>,
) -> ModbusResult<()> {
    let value = resolve_field_value(spec, supplied)?;

    match spec.width {
        FieldWidth::U8 => encode_u8(value as u8, out),
        FieldWidth::U16 => encode_u16(value, out),
    }

    Ok(())
}

pub fn decode_field(spec: &FieldSpec, data: &mut Cursor<&[u8]>) -> ModbusResult<u16> {
    match spec.width {
        FieldWidth::U8 => decode_u8(data).map(u16::from),
        FieldWidth::U16 => decode_u16(data),
    }
}
