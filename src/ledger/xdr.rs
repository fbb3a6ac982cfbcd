//! Minimal XDR (RFC 4506) encoder covering the transaction wire format.
//!
//! Only the writer side exists: the wallet builds and signs envelopes
//! but never parses ledger XDR (Horizon responses are JSON). All
//! integers are big-endian; opaque and string data pad to four-byte
//! boundaries.

#[derive(Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Fixed-length opaque data.
    pub fn opaque(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.pad(data.len());
    }

    /// Variable-length opaque data: length prefix, bytes, padding.
    pub fn var_opaque(&mut self, data: &[u8]) {
        self.u32(data.len() as u32);
        self.opaque(data);
    }

    pub fn string(&mut self, value: &str) {
        self.var_opaque(value.as_bytes());
    }

    /// Splice in already-encoded XDR.
    pub fn raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn pad(&mut self, len: usize) {
        for _ in 0..(4 - len % 4) % 4 {
            self.buf.push(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_big_endian() {
        let mut enc = Encoder::new();
        enc.u32(1);
        enc.i64(-2);
        assert_eq!(
            enc.into_bytes(),
            [0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]
        );
    }

    #[test]
    fn var_opaque_pads_to_four_bytes() {
        let mut enc = Encoder::new();
        enc.var_opaque(&[1, 2, 3, 4, 5]);
        assert_eq!(enc.into_bytes(), [0, 0, 0, 5, 1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn aligned_data_gets_no_padding() {
        let mut enc = Encoder::new();
        enc.var_opaque(&[1, 2, 3, 4]);
        assert_eq!(enc.into_bytes(), [0, 0, 0, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn strings_encode_like_opaque_bytes() {
        let mut enc = Encoder::new();
        enc.string("hi");
        assert_eq!(enc.into_bytes(), [0, 0, 0, 2, b'h', b'i', 0, 0]);
    }
}
