//! Thin `Encoder`/`Decoder` convenience wrappers over `alloy_rlp`, used to encode and
//! decode the trie's own node structures without handwriting list headers at every
//! call site.
use alloy_rlp::{BufMut, Decodable, Encodable, Header};

/// Accumulates RLP-encoded fields and wraps them in a single list header on
/// `finish`.
pub struct Encoder {
    fields: Vec<Vec<u8>>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field<T: Encodable>(mut self, value: &T) -> Self {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        self.fields.push(buf);
        self
    }

    pub fn finish(self, out: &mut dyn BufMut) {
        let payload_length: usize = self.fields.iter().map(|f| f.len()).sum();
        Header {
            list: true,
            payload_length,
        }
        .encode(out);
        for field in self.fields {
            out.put_slice(&field);
        }
    }

    pub fn length(&self) -> usize {
        let payload_length: usize = self.fields.iter().map(|f| f.len()).sum();
        let header = Header {
            list: true,
            payload_length,
        };
        header.length() + payload_length
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Peels fields off an RLP list payload in order.
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(mut rlp: &'a [u8]) -> Result<Self, alloy_rlp::Error> {
        let header = Header::decode(&mut rlp)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        Ok(Self {
            buf: &rlp[..header.payload_length],
        })
    }

    pub fn field<T: Decodable>(&mut self) -> Result<T, alloy_rlp::Error> {
        T::decode(&mut self.buf)
    }

    pub fn finish(self) -> Result<(), alloy_rlp::Error> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(alloy_rlp::Error::ListLengthMismatch {
                expected: 0,
                got: self.buf.len(),
            })
        }
    }
}
