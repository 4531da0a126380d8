mod fields;
mod tcp;

pub use fields::{
    decode_field, decode_u16, decode_u8, encode_field, encode_u16, encode_u8, resolve_field_value,
};
pub use tcp::{decode, decode_frame, encode, encode_frame};
