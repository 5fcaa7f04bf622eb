// ---------------------------------------------------------------------------
// save_codec – little-endian primitives over the logical save stream
// ---------------------------------------------------------------------------
//
// Reads never fail. Reading past the end yields zeros and raises the
// `overrun` flag; the session controller checks it once the stream has been
// consumed.

use simulation::config::{fix_to_flt, flt_to_fix};

#[derive(Debug, Default)]
pub struct SaveWriter {
    buf: Vec<u8>,
}

impl SaveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Raw IEEE-754 bits.
    pub fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// 16.16 fixed point.
    pub fn write_fixed(&mut self, v: f32) {
        self.write_i32(flt_to_fix(v));
    }

    /// Map units stored as a truncated short.
    pub fn write_height(&mut self, v: f32) {
        self.write_i16(v as i16);
    }

    /// Normalized value stored as a byte in `0..=255`.
    pub fn write_unit_u8(&mut self, v: f32) {
        self.write_u8((v.clamp(0.0, 1.0) * 255.0).round() as u8);
    }

    /// Normalized value stored as a long scaled by 255.
    pub fn write_unit_i32(&mut self, v: f32) {
        self.write_i32((v * 255.0).round() as i32);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Fixed-width text field, truncated or NUL padded to `len`. Truncation
    /// never splits a character.
    pub fn write_name(&mut self, name: &str, len: usize) {
        let n = name
            .char_indices()
            .map(|(at, c)| at + c.len_utf8())
            .take_while(|&end| end <= len)
            .last()
            .unwrap_or(0);
        self.buf.extend_from_slice(&name.as_bytes()[..n]);
        self.buf.resize(self.buf.len() + (len - n), 0);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct SaveReader<'a> {
    data: &'a [u8],
    pos: usize,
    overrun: bool,
}

impl<'a> SaveReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            overrun: false,
        }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        match self.data.get(self.pos..self.pos + N) {
            Some(src) => {
                out.copy_from_slice(src);
                self.pos += N;
            }
            None => {
                self.overrun = true;
                self.pos = self.data.len();
            }
        }
        out
    }

    pub fn read_u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub fn read_i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    pub fn read_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    pub fn read_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub fn read_f32(&mut self) -> f32 {
        f32::from_bits(self.read_u32())
    }

    pub fn read_fixed(&mut self) -> f32 {
        fix_to_flt(self.read_i32())
    }

    pub fn read_height(&mut self) -> f32 {
        f32::from(self.read_i16())
    }

    pub fn read_unit_u8(&mut self) -> f32 {
        f32::from(self.read_u8()) / 255.0
    }

    pub fn read_unit_i32(&mut self) -> f32 {
        self.read_i32() as f32 / 255.0
    }

    pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
        let data = self.data;
        match data.get(self.pos..self.pos + len) {
            Some(src) => {
                self.pos += len;
                src
            }
            None => {
                self.overrun = true;
                self.pos = data.len();
                &[]
            }
        }
    }

    /// Fixed-width text field up to the first NUL.
    pub fn read_name(&mut self, len: usize) -> String {
        let raw = self.read_bytes(len);
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    /// Whether any read ran past the end of the stream.
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_little_endian() {
        let mut w = SaveWriter::new();
        w.write_i16(0x0102);
        w.write_i32(0x0304_0506);
        w.write_f32(1.0);
        assert_eq!(
            w.into_bytes(),
            vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x00, 0x00, 0x80, 0x3f]
        );
    }

    #[test]
    fn test_fixed_and_unit_values() {
        let mut w = SaveWriter::new();
        w.write_fixed(-2.5);
        w.write_unit_u8(0.5);
        w.write_unit_i32(200.0 / 255.0);
        w.write_height(96.75);
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes);
        assert_eq!(r.read_fixed(), -2.5);
        assert_eq!(r.read_u8(), 128);
        assert_eq!(r.read_i32(), 200);
        assert_eq!(r.read_height(), 96.0);
        assert!(!r.overrun());
    }

    #[test]
    fn test_name_padding_and_truncation() {
        let mut w = SaveWriter::new();
        w.write_name("FLAT5", 8);
        w.write_name("MUCHTOOLONG", 8);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 16);
        let mut r = SaveReader::new(&bytes);
        assert_eq!(r.read_name(8), "FLAT5");
        assert_eq!(r.read_name(8), "MUCHTOOL");
    }

    #[test]
    fn test_name_truncated_on_char_boundary() {
        let mut w = SaveWriter::new();
        // The third character straddles the field width.
        w.write_name("ÉTÉ", 4);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0xC3, 0x89, b'T', 0]);
        assert_eq!(SaveReader::new(&bytes).read_name(4), "ÉT");
    }

    #[test]
    fn test_read_past_end_yields_zero_and_flags() {
        let bytes = [0x01, 0x02];
        let mut r = SaveReader::new(&bytes);
        assert_eq!(r.read_i32(), 0);
        assert!(r.overrun());
        assert_eq!(r.read_u8(), 0);
        assert_eq!(r.remaining(), 0);
        assert!(r.read_bytes(3).is_empty());
    }
}
