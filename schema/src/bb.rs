use std::str;

/// A wire byte buffer meant for reading.
///
/// All multi-byte quantities are big-endian and fixed width. Strings carry a
/// 4-byte length prefix and no terminator.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_wire_schema::ByteBuffer::new(&[0, 0, 0, 2, 65, 108, 1, 44]);
/// assert_eq!(bb.read_astring(), Ok(b"Al".to_vec()));
/// assert_eq!(bb.read_u16(), Ok(300));
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read a boolean value starting at the current index. Only 0 and 1
    /// are accepted.
    pub fn read_bool(&mut self) -> Result<bool, ()> {
        match self.read_byte() {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            _ => Err(()),
        }
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, ()> {
        if self.index >= self.data.len() {
            Err(())
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        if len > self.remaining() {
            Err(())
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ()> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, ()> {
        self.read_byte()
    }

    pub fn read_u16(&mut self) -> Result<u16, ()> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ()> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ()> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, ()> {
        Ok(self.read_byte()? as i8)
    }

    pub fn read_i16(&mut self) -> Result<i16, ()> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ()> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, ()> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ()> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, ()> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Try to read an unsigned integer that was written with `num_bytes`
    /// bytes. This is how enums of every width are framed.
    pub fn read_uint(&mut self, num_bytes: usize) -> Result<u64, ()> {
        if num_bytes == 0 || num_bytes > 8 {
            return Err(());
        }

        let mut value: u64 = 0;
        for byte in self.read_bytes(num_bytes)? {
            value = (value << 8) | *byte as u64;
        }

        Ok(value)
    }

    /// Try to read a length-prefixed byte string.
    pub fn read_astring(&mut self) -> Result<Vec<u8>, ()> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Try to read a length-prefixed UTF-8 string. Invalid UTF-8 is an error.
    pub fn read_ustring(&mut self) -> Result<String, ()> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        str::from_utf8(bytes).map(str::to_owned).map_err(|_| ())
    }
}

#[test]
fn read_bool() {
    let read = |bytes| ByteBuffer::new(bytes).read_bool();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(false));
    assert_eq!(read(&[1]), Ok(true));
    assert_eq!(read(&[2]), Err(()));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(()));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(()));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.remaining(), 2);
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert_eq!(bb.read_bytes(1), Err(()));
}

#[test]
fn borrowed_reads_outlive_buffer() {
    fn payload(bytes: &[u8]) -> Result<&[u8], ()> {
        let mut bb = ByteBuffer::new(bytes);
        let len = bb.read_u32()? as usize;
        bb.read_bytes(len)
    }
    let bytes = [0, 0, 0, 2, 7, 8, 9];
    assert_eq!(payload(&bytes), Ok(&bytes[4..6]));
}

#[test]
fn read_fixed_width() {
    assert_eq!(ByteBuffer::new(&[0x12, 0x34]).read_u16(), Ok(0x1234));
    assert_eq!(ByteBuffer::new(&[0x12]).read_u16(), Err(()));
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 1]).read_u32(), Ok(1));
    assert_eq!(ByteBuffer::new(&[255, 255, 255, 255]).read_i32(), Ok(-1));
    assert_eq!(ByteBuffer::new(&[255, 254]).read_i16(), Ok(-2));
    assert_eq!(ByteBuffer::new(&[0x80]).read_i8(), Ok(-128));
    assert_eq!(
        ByteBuffer::new(&[1, 2, 3, 4, 5, 6, 7, 8]).read_u64(),
        Ok(0x0102_0304_0506_0708)
    );
    assert_eq!(
        ByteBuffer::new(&[255, 255, 255, 255, 255, 255, 255, 253]).read_i64(),
        Ok(-3)
    );
}

#[test]
fn read_floats() {
    assert_eq!(ByteBuffer::new(&[0x3f, 0x80, 0, 0]).read_f32(), Ok(1.0));
    assert_eq!(ByteBuffer::new(&[0xc0, 0, 0, 0]).read_f32(), Ok(-2.0));
    assert_eq!(
        ByteBuffer::new(&[0x3f, 0xe0, 0, 0, 0, 0, 0, 0]).read_f64(),
        Ok(0.5)
    );
    assert_eq!(ByteBuffer::new(&[0x3f, 0xe0, 0, 0]).read_f64(), Err(()));
}

#[test]
fn read_uint() {
    let read = |bytes, n| ByteBuffer::new(bytes).read_uint(n);
    assert_eq!(read(&[1], 1), Ok(1));
    assert_eq!(read(&[3, 232], 2), Ok(1000));
    assert_eq!(read(&[1, 0, 0], 3), Ok(65536));
    assert_eq!(read(&[1, 0, 0, 84], 4), Ok(16_777_300));
    assert_eq!(read(&[1, 0], 3), Err(()));
    assert_eq!(read(&[1], 0), Err(()));
    assert_eq!(read(&[0; 9], 9), Err(()));
}

#[test]
fn read_strings() {
    let read = |bytes| ByteBuffer::new(bytes).read_astring();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0, 0, 0, 0]), Ok(vec![]));
    assert_eq!(read(&[0, 0, 0, 2, 65]), Err(()));
    assert_eq!(read(&[0, 0, 0, 2, 65, 108]), Ok(b"Al".to_vec()));
    assert_eq!(read(&[0, 0, 0, 1, 0xff]), Ok(vec![0xff]));

    let read = |bytes| ByteBuffer::new(bytes).read_ustring();
    assert_eq!(read(&[0, 0, 0, 0]), Ok(String::new()));
    assert_eq!(
        read(&[0, 0, 0, 4, 240, 159, 141, 149]),
        Ok("🍕".to_owned())
    );
    assert_eq!(read(&[0, 0, 0, 1, 0xff]), Err(()));
}

#[test]
fn read_sequence() {
    let mut bb = ByteBuffer::new(&[
        1, 0, 0, 0, 3, 97, 98, 99, 0x41, 0x20, 0, 0, 0, 7,
    ]);
    assert_eq!(bb.read_bool(), Ok(true));
    assert_eq!(bb.read_astring(), Ok(b"abc".to_vec()));
    assert_eq!(bb.read_f32(), Ok(10.0));
    assert_eq!(bb.read_u16(), Ok(7));
    assert_eq!(bb.index(), bb.data().len());
}

/// A wire byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_wire_schema::ByteBufferMut::new();
/// bb.write_astring(b"Al");
/// bb.write_u16(300);
/// assert_eq!(bb.data(), [0, 0, 0, 2, 65, 108, 1, 44]);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Creates an empty buffer that can hold `capacity` bytes without
    /// reallocating. Pair this with a `packed_size` call.
    pub fn with_capacity(capacity: usize) -> ByteBufferMut {
        ByteBufferMut {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a boolean value to the end of the buffer.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(if value { 1 } else { 0 });
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_byte(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_byte(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Write the low `num_bytes` bytes of `value`, most significant first.
    pub fn write_uint(&mut self, value: u64, num_bytes: usize) {
        let bytes = value.to_be_bytes();
        let num_bytes = num_bytes.min(bytes.len());
        self.write_bytes(&bytes[bytes.len() - num_bytes..]);
    }

    /// Write a byte string with its 4-byte length prefix.
    pub fn write_astring(&mut self, value: &[u8]) {
        self.write_u32(value.len() as u32);
        self.write_bytes(value);
    }

    /// Write a string as its UTF-8 bytes with a 4-byte length prefix.
    pub fn write_ustring(&mut self, value: &str) {
        self.write_astring(value.as_bytes());
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_fixed_width() {
    assert_eq!(write_once(|bb| bb.write_u8(255)), [255]);
    assert_eq!(write_once(|bb| bb.write_i8(-1)), [255]);
    assert_eq!(write_once(|bb| bb.write_u16(0x1234)), [0x12, 0x34]);
    assert_eq!(write_once(|bb| bb.write_i16(-2)), [255, 254]);
    assert_eq!(write_once(|bb| bb.write_i32(1)), [0, 0, 0, 1]);
    assert_eq!(write_once(|bb| bb.write_i32(2)), [0, 0, 0, 2]);
    assert_eq!(write_once(|bb| bb.write_u32(u32::MAX)), [255, 255, 255, 255]);
    assert_eq!(
        write_once(|bb| bb.write_u64(0x0102_0304_0506_0708)),
        [1, 2, 3, 4, 5, 6, 7, 8]
    );
    assert_eq!(
        write_once(|bb| bb.write_i64(-3)),
        [255, 255, 255, 255, 255, 255, 255, 253]
    );
}

#[test]
fn write_floats() {
    assert_eq!(write_once(|bb| bb.write_f32(1.0)), [0x3f, 0x80, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_f32(-2.0)), [0xc0, 0, 0, 0]);
    assert_eq!(
        write_once(|bb| bb.write_f64(0.5)),
        [0x3f, 0xe0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn write_uint() {
    assert_eq!(write_once(|bb| bb.write_uint(1, 1)), [1]);
    assert_eq!(write_once(|bb| bb.write_uint(200, 1)), [200]);
    assert_eq!(write_once(|bb| bb.write_uint(1000, 2)), [3, 232]);
    assert_eq!(write_once(|bb| bb.write_uint(65536, 3)), [1, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_uint(16_777_300, 4)), [1, 0, 0, 84]);
    assert_eq!(write_once(|bb| bb.write_uint(0x1ff, 1)), [0xff]);
}

#[test]
fn write_strings() {
    assert_eq!(write_once(|bb| bb.write_astring(b"")), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_astring(b"Al")), [0, 0, 0, 2, 65, 108]);
    assert_eq!(
        write_once(|bb| bb.write_ustring("🍕")),
        [0, 0, 0, 4, 240, 159, 141, 149]
    );
}

#[test]
fn write_sequence() {
    let mut bb = ByteBufferMut::with_capacity(14);
    assert!(bb.is_empty());
    bb.write_bool(true);
    bb.write_astring(b"abc");
    bb.write_f32(10.0);
    bb.write_u16(7);
    assert_eq!(bb.len(), 14);
    assert_eq!(
        bb.data(),
        [1, 0, 0, 0, 3, 97, 98, 99, 0x41, 0x20, 0, 0, 0, 7]
    );
}
