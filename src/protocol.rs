use crate::common::PROTOCOL_ID;
use crate::error::{ModbusError, ModbusResult};

pub const TRANSACTION_IDENTIFIER: &str = "transactionIdentifier";
pub const PROTOCOL_IDENTIFIER: &str = "protocolIdentifier";
pub const LENGTH_FIELD: &str = "lengthField";
pub const UNIT_IDENTIFIER: &str = "unitIdentifier";
pub const FUNCTION_CODE: &str = "functionCode";

/// Header layout every Modbus TCP/IP frame must follow, in wire order
const HEADER_LAYOUT: [(&str, FieldWidth); 5] = [
    (TRANSACTION_IDENTIFIER, FieldWidth::U16),
    (PROTOCOL_IDENTIFIER, FieldWidth::U16),
    (LENGTH_FIELD, FieldWidth::U16),
    (UNIT_IDENTIFIER, FieldWidth::U8),
    (FUNCTION_CODE, FieldWidth::U8),
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldWidth {
    U8,
    U16,
}

impl FieldWidth {
    pub fn byte_len(&self) -> usize {
        match self {
            FieldWidth::U8 => 1,
            FieldWidth::U16 => 2,
        }
    }

    pub fn max_value(&self) -> u16 {
        match self {
            FieldWidth::U8 => u16::from(u8::MAX),
            FieldWidth::U16 => u16::MAX,
        }
    }
}

/// One fixed-width big-endian field of a frame
///
/// A field either carries a fixed value (resolved from the specification
/// itself) or is a placeholder filled in at instantiation time.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub width: FieldWidth,
    pub fixed: Option<u16>,
}

impl FieldSpec {
    pub fn u8(name: impl Into<String>, fixed: Option<u16>) -> Self {
        FieldSpec {
            name: name.into(),
            width: FieldWidth::U8,
            fixed,
        }
    }

    pub fn u16(name: impl Into<String>, fixed: Option<u16>) -> Self {
        FieldSpec {
            name: name.into(),
            width: FieldWidth::U16,
            fixed,
        }
    }
}

/// The protocol schema a caller defines once at startup
///
/// Immutable after construction; the field order is positional and matches
/// the MBAP wire layout.
#[derive(Clone, PartialEq, Debug)]
pub struct ProtocolDefinition {
    name: String,
    header_fields: Vec<FieldSpec>,
}

impl ProtocolDefinition {
    /// The canonical Modbus TCP/IP schema with the protocol identifier
    /// fixed to its constant
    pub fn modbus_tcp() -> Self {
        ProtocolDefinition {
            name: "modbus".to_string(),
            header_fields: vec![
                FieldSpec::u16(TRANSACTION_IDENTIFIER, None),
                FieldSpec::u16(PROTOCOL_IDENTIFIER, Some(PROTOCOL_ID)),
                FieldSpec::u16(LENGTH_FIELD, None),
                FieldSpec::u8(UNIT_IDENTIFIER, None),
                FieldSpec::u8(FUNCTION_CODE, None),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header_fields(&self) -> &[FieldSpec] {
        &self.header_fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.header_fields.iter().find(|field| field.name == name)
    }
}

/// Step-by-step schema construction, ended by `end_protocol`
///
/// Mirrors how a host test library declares the protocol: one call per
/// header field in wire order, then the variable-length pdu section.
pub struct ProtocolBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    has_pdu: bool,
}

impl ProtocolBuilder {
    pub fn new_protocol(name: impl Into<String>) -> Self {
        ProtocolBuilder {
            name: name.into(),
            fields: Vec::new(),
            has_pdu: false,
        }
    }

    pub fn u16(mut self, name: impl Into<String>, fixed: Option<u16>) -> Self {
        self.fields.push(FieldSpec::u16(name, fixed));
        self
    }

    pub fn u8(mut self, name: impl Into<String>, fixed: Option<u16>) -> Self {
        self.fields.push(FieldSpec::u8(name, fixed));
        self
    }

    pub fn pdu(mut self) -> Self {
        self.has_pdu = true;
        self
    }

    pub fn end_protocol(self) -> ModbusResult<ProtocolDefinition> {
        if !self.has_pdu {
            return Err(ModbusError::ProtocolDefinition(
                "protocol must end with a pdu section".to_string(),
            ));
        }

        if self.fields.len() != HEADER_LAYOUT.len() {
            return Err(ModbusError::ProtocolDefinition(format!(
                "expected {} header fields, got {}",
                HEADER_LAYOUT.len(),
                self.fields.len()
            )));
        }

        for (field, (expected_name, expected_width)) in self.fields.iter().zip(HEADER_LAYOUT) {
            if field.name != expected_name || field.width != expected_width {
                return Err(ModbusError::ProtocolDefinition(format!(
                    "header field '{}' out of place, expected '{}'",
                    field.name, expected_name
                )));
            }
        }

        // The protocol identifier is a constant of the protocol itself
        let protocol_field = &self.fields[1];
        match protocol_field.fixed {
            Some(PROTOCOL_ID) => {}
            Some(other) => {
                return Err(ModbusError::ProtocolDefinition(format!(
                    "protocolIdentifier must be fixed to {}, got {}",
                    PROTOCOL_ID, other
                )))
            }
            None => {
                return Err(ModbusError::ProtocolDefinition(
                    "protocolIdentifier must carry a fixed value".to_string(),
                ))
            }
        }

        Ok(ProtocolDefinition {
            name: self.name,
            header_fields: self.fields,
        })
    }
}
