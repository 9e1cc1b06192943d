use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    indent::{format_float, Indent},
};

/// The operations generated code expects from every member type.
///
/// Builtin scalars and strings implement this here. Generated types provide
/// inherent methods with the same names and signatures, so a generated
/// `pack` can call `self.member.pack(bb)` whatever the member type is.
pub trait Wire: Default {
    fn packed_size(&self) -> usize;
    fn pack(&self, bb: &mut ByteBufferMut);
    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()>;
    fn print(&self, out: &mut String, indent: &Indent, level: usize);
    fn copy_from(&mut self, src: &Self);
    fn clear(&mut self);
}

/// Types whose encoding has the same length for every value.
pub trait FixedSize {
    const PACKED_SIZE: usize;
}

macro_rules! impl_wire_number {
    ($($ty:ty => $write:ident, $read:ident;)*) => {$(
        impl FixedSize for $ty {
            const PACKED_SIZE: usize = std::mem::size_of::<$ty>();
        }

        impl Wire for $ty {
            fn packed_size(&self) -> usize {
                <$ty as FixedSize>::PACKED_SIZE
            }

            fn pack(&self, bb: &mut ByteBufferMut) {
                bb.$write(*self);
            }

            fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
                *self = bb.$read()?;
                Ok(())
            }

            fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
                out.push_str(&self.to_string());
            }

            fn copy_from(&mut self, src: &Self) {
                *self = *src;
            }

            fn clear(&mut self) {
                *self = <$ty>::default();
            }
        }
    )*};
}

impl_wire_number! {
    u8  => write_u8,  read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8  => write_i8,  read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
}

impl FixedSize for f32 {
    const PACKED_SIZE: usize = 4;
}

impl Wire for f32 {
    fn packed_size(&self) -> usize {
        <f32 as FixedSize>::PACKED_SIZE
    }

    fn pack(&self, bb: &mut ByteBufferMut) {
        bb.write_f32(*self);
    }

    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
        *self = bb.read_f32()?;
        Ok(())
    }

    fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
        out.push_str(&format_float(*self as f64));
    }

    fn copy_from(&mut self, src: &Self) {
        *self = *src;
    }

    fn clear(&mut self) {
        *self = 0.0;
    }
}

impl FixedSize for f64 {
    const PACKED_SIZE: usize = 8;
}

impl Wire for f64 {
    fn packed_size(&self) -> usize {
        <f64 as FixedSize>::PACKED_SIZE
    }

    fn pack(&self, bb: &mut ByteBufferMut) {
        bb.write_f64(*self);
    }

    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
        *self = bb.read_f64()?;
        Ok(())
    }

    fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
        out.push_str(&format_float(*self));
    }

    fn copy_from(&mut self, src: &Self) {
        *self = *src;
    }

    fn clear(&mut self) {
        *self = 0.0;
    }
}

impl FixedSize for bool {
    const PACKED_SIZE: usize = 1;
}

impl Wire for bool {
    fn packed_size(&self) -> usize {
        <bool as FixedSize>::PACKED_SIZE
    }

    fn pack(&self, bb: &mut ByteBufferMut) {
        bb.write_bool(*self);
    }

    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
        *self = bb.read_bool()?;
        Ok(())
    }

    fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
        out.push_str(if *self { "true" } else { "false" });
    }

    fn copy_from(&mut self, src: &Self) {
        *self = *src;
    }

    fn clear(&mut self) {
        *self = false;
    }
}

/// `astring`: raw bytes with no encoding attached.
impl Wire for Vec<u8> {
    fn packed_size(&self) -> usize {
        4 + self.len()
    }

    fn pack(&self, bb: &mut ByteBufferMut) {
        bb.write_astring(self);
    }

    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
        *self = bb.read_astring()?;
        Ok(())
    }

    fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
        out.push('"');
        out.push_str(&String::from_utf8_lossy(self));
        out.push('"');
    }

    fn copy_from(&mut self, src: &Self) {
        Vec::clear(self);
        self.extend_from_slice(src);
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

/// `ustring`: travels as UTF-8.
impl Wire for String {
    fn packed_size(&self) -> usize {
        4 + self.len()
    }

    fn pack(&self, bb: &mut ByteBufferMut) {
        bb.write_ustring(self);
    }

    fn unpack(&mut self, bb: &mut ByteBuffer) -> Result<(), ()> {
        *self = bb.read_ustring()?;
        Ok(())
    }

    fn print(&self, out: &mut String, _indent: &Indent, _level: usize) {
        out.push('"');
        out.push_str(self);
        out.push('"');
    }

    fn copy_from(&mut self, src: &Self) {
        String::clear(self);
        self.push_str(src);
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack<T: Wire>(value: &T) -> Vec<u8> {
        let mut bb = ByteBufferMut::new();
        value.pack(&mut bb);
        let bytes = bb.data();
        assert_eq!(bytes.len(), value.packed_size());
        bytes
    }

    fn unpack<T: Wire>(bytes: &[u8]) -> Result<T, ()> {
        let mut value = T::default();
        value.unpack(&mut ByteBuffer::new(bytes))?;
        Ok(value)
    }

    fn print<T: Wire>(value: &T) -> String {
        let mut out = String::new();
        value.print(&mut out, &Indent::default(), 0);
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(pack(&1i32), [0, 0, 0, 1]);
        assert_eq!(pack(&-2i16), [255, 254]);
        assert_eq!(pack(&7u64), [0, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(pack(&1.0f32), [0x3f, 0x80, 0, 0]);
        assert_eq!(unpack::<u16>(&[1, 44]), Ok(300));
        assert_eq!(unpack::<i8>(&[0xff]), Ok(-1));
        assert_eq!(unpack::<u32>(&[0, 0]), Err(()));
        assert_eq!(<u16 as FixedSize>::PACKED_SIZE, 2);
        assert_eq!(<f64 as FixedSize>::PACKED_SIZE, 8);
        assert_eq!(print(&-12i64), "-12");
        assert_eq!(print(&2.5f64), "2.5");
    }

    #[test]
    fn booleans() {
        assert_eq!(pack(&true), [1]);
        assert_eq!(unpack::<bool>(&[0]), Ok(false));
        assert_eq!(unpack::<bool>(&[3]), Err(()));
        assert_eq!(print(&true), "true");
    }

    #[test]
    fn strings() {
        assert_eq!(pack(&b"Al".to_vec()), [0, 0, 0, 2, 65, 108]);
        assert_eq!(pack(&"é".to_owned()), [0, 0, 0, 2, 0xc3, 0xa9]);
        assert_eq!(unpack::<String>(&[0, 0, 0, 2, 0xc3, 0xa9]), Ok("é".to_owned()));
        assert_eq!(print(&b"Al".to_vec()), "\"Al\"");

        let mut dst = b"old".to_vec();
        Wire::copy_from(&mut dst, &b"new!".to_vec());
        assert_eq!(dst, b"new!");
        Wire::clear(&mut dst);
        assert!(dst.is_empty());
    }
}
