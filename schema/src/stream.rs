use std::io::{self, Read, Write};

use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    traits::{FixedSize, Wire},
};

/// Reading and writing the wire encoding straight from and to byte streams.
///
/// Builtins implement this here. Generated types provide inherent
/// `read_from`/`write_to` methods with the same signatures, so generated
/// code can call `self.member.read_from(r)` whatever the member type is.
pub trait Stream {
    fn read_from<R: Read>(&mut self, r: &mut R) -> io::Result<()>;
    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()>;
}

fn invalid_data() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "malformed wire data")
}

/// Reads exactly `len` bytes without trusting `len` for the allocation.
pub fn read_bytes<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    r.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(bytes)
}

pub fn read_bool<R: Read>(r: &mut R) -> io::Result<bool> {
    let mut value = false;
    value.read_from(r)?;
    Ok(value)
}

pub fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut value = 0u32;
    value.read_from(r)?;
    Ok(value)
}

/// Reads an unsigned integer framed in `num_bytes` bytes, as enums are.
pub fn read_uint<R: Read>(r: &mut R, num_bytes: usize) -> io::Result<u64> {
    let bytes = read_bytes(r, num_bytes)?;
    ByteBuffer::new(&bytes).read_uint(num_bytes).map_err(|()| invalid_data())
}

/// Writes any packable value in one `write_all`.
pub fn write_packed<T: Wire, W: Write>(value: &T, w: &mut W) -> io::Result<()> {
    let mut bb = ByteBufferMut::with_capacity(value.packed_size());
    value.pack(&mut bb);
    w.write_all(&bb.data())
}

fn read_fixed<T: Wire + FixedSize, R: Read>(value: &mut T, r: &mut R) -> io::Result<()> {
    let bytes = read_bytes(r, T::PACKED_SIZE)?;
    value.unpack(&mut ByteBuffer::new(&bytes)).map_err(|()| invalid_data())
}

macro_rules! impl_stream_fixed {
    ($($ty:ty),*) => {$(
        impl Stream for $ty {
            fn read_from<R: Read>(&mut self, r: &mut R) -> io::Result<()> {
                read_fixed(self, r)
            }

            fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
                write_packed(self, w)
            }
        }
    )*};
}

impl_stream_fixed!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64, bool);

impl Stream for Vec<u8> {
    fn read_from<R: Read>(&mut self, r: &mut R) -> io::Result<()> {
        let len = read_u32(r)? as usize;
        *self = read_bytes(r, len)?;
        Ok(())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_packed(self, w)
    }
}

impl Stream for String {
    fn read_from<R: Read>(&mut self, r: &mut R) -> io::Result<()> {
        let len = read_u32(r)? as usize;
        *self = String::from_utf8(read_bytes(r, len)?).map_err(|_| invalid_data())?;
        Ok(())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_packed(self, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: Stream + Default>(bytes: &[u8]) -> io::Result<T> {
        let mut value = T::default();
        value.read_from(&mut &bytes[..])?;
        Ok(value)
    }

    #[test]
    fn scalars() {
        assert_eq!(read::<i32>(&[0, 0, 0, 1]).unwrap(), 1);
        assert_eq!(read::<f32>(&[0x3f, 0x80, 0, 0]).unwrap(), 1.0);
        assert_eq!(read::<bool>(&[2]).unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(read::<u64>(&[0, 0]).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(read_uint(&mut &[1, 0, 2][..], 3).unwrap(), 0x10002);

        let mut out = Vec::new();
        (-2i16).write_to(&mut out).unwrap();
        true.write_to(&mut out).unwrap();
        assert_eq!(out, [255, 254, 1]);
    }

    #[test]
    fn strings() {
        let mut out = Vec::new();
        "é".to_owned().write_to(&mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 2, 0xc3, 0xa9]);
        assert_eq!(read::<String>(&out).unwrap(), "é");
        assert_eq!(read::<String>(&[0, 0, 0, 1, 0xff]).unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(read::<Vec<u8>>(&[0, 0, 0, 2, b'h', b'i']).unwrap(), b"hi");
    }

    #[test]
    fn huge_lengths_fail_without_allocating() {
        let err = read::<Vec<u8>>(&[0xff, 0xff, 0xff, 0xff, 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn consecutive_reads_share_the_stream() {
        let bytes = [0, 0, 0, 1, b'a', 7];
        let mut r = &bytes[..];
        let mut text = Vec::new();
        text.read_from(&mut r).unwrap();
        let mut tail = 0u8;
        tail.read_from(&mut r).unwrap();
        assert_eq!((text, tail), (b"a".to_vec(), 7));
    }
}
