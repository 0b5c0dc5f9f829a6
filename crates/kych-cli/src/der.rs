//! Minimal DER TLV reading: just enough to pull the RSA modulus out of a
//! certificate's `SubjectPublicKeyInfo` and out of a recovered private key
//! (PKCS#1, or PKCS#8 wrapping PKCS#1).
//!
//! This is a fixed walk over known structures, not a general ASN.1 parser;
//! anything unexpected is `None` and the candidate is simply not matched.

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_CONTEXT_0: u8 = 0xA0;

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Reads one TLV, returning the tag and its contents.
    fn read(&mut self) -> Option<(u8, &'a [u8])> {
        let tag = *self.data.get(self.pos)?;
        let first = *self.data.get(self.pos + 1)?;
        let (len, header) = if first < 0x80 {
            (first as usize, 2)
        } else {
            let count = (first & 0x7F) as usize;
            if count == 0 || count > 4 {
                return None;
            }
            let mut len = 0usize;
            for i in 0..count {
                len = (len << 8) | *self.data.get(self.pos + 2 + i)? as usize;
            }
            (len, 2 + count)
        };
        let start = self.pos.checked_add(header)?;
        let end = start.checked_add(len)?;
        let contents = self.data.get(start..end)?;
        self.pos = end;
        Some((tag, contents))
    }

    /// Reads one TLV and requires a specific tag.
    fn expect(&mut self, want: u8) -> Option<&'a [u8]> {
        let (tag, contents) = self.read()?;
        (tag == want).then_some(contents)
    }
}

/// Strips the leading zero DER prepends to non-negative integers with a
/// high bit set.
fn trim_uint(bytes: &[u8]) -> &[u8] {
    match bytes {
        [0, rest @ ..] if !rest.is_empty() => rest,
        other => other,
    }
}

/// The RSA modulus from an X.509 certificate's `SubjectPublicKeyInfo`.
pub fn certificate_rsa_modulus(der: &[u8]) -> Option<Vec<u8>> {
    let mut outer = Reader::new(der);
    let cert = outer.expect(TAG_SEQUENCE)?;

    let mut cert = Reader::new(cert);
    let tbs = cert.expect(TAG_SEQUENCE)?;

    let mut tbs = Reader::new(tbs);
    if tbs.peek_tag() == Some(TAG_CONTEXT_0) {
        tbs.read()?; // explicit version
    }
    tbs.expect(TAG_INTEGER)?; // serial number
    tbs.expect(TAG_SEQUENCE)?; // signature algorithm
    tbs.expect(TAG_SEQUENCE)?; // issuer
    tbs.expect(TAG_SEQUENCE)?; // validity
    tbs.expect(TAG_SEQUENCE)?; // subject
    let spki = tbs.expect(TAG_SEQUENCE)?;

    let mut spki = Reader::new(spki);
    spki.expect(TAG_SEQUENCE)?; // algorithm identifier
    let bits = spki.expect(TAG_BIT_STRING)?;
    let (&unused, key) = bits.split_first()?;
    if unused != 0 {
        return None;
    }

    let mut key = Reader::new(key);
    let rsa = key.expect(TAG_SEQUENCE)?;
    let mut rsa = Reader::new(rsa);
    let modulus = rsa.expect(TAG_INTEGER)?;
    Some(trim_uint(modulus).to_vec())
}

/// The RSA modulus from recovered private-key material: a PKCS#1
/// `RSAPrivateKey`, or a PKCS#8 `PrivateKeyInfo` wrapping one.
pub fn private_key_rsa_modulus(der: &[u8]) -> Option<Vec<u8>> {
    let mut outer = Reader::new(der);
    let body = outer.expect(TAG_SEQUENCE)?;

    let mut body = Reader::new(body);
    body.expect(TAG_INTEGER)?; // version
    match body.peek_tag()? {
        // PKCS#1: the modulus follows the version directly.
        TAG_INTEGER => {
            let modulus = body.expect(TAG_INTEGER)?;
            Some(trim_uint(modulus).to_vec())
        }
        // PKCS#8: algorithm identifier, then the PKCS#1 key as an octet
        // string.
        TAG_SEQUENCE => {
            body.expect(TAG_SEQUENCE)?;
            let inner = body.expect(TAG_OCTET_STRING)?;
            private_key_rsa_modulus(inner)
        }
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::testdata::{certificate, pkcs1_key, pkcs8_key};
    use super::*;

    const MODULUS: [u8; 32] = [
        0xD1, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E,
        0x1F, 0x20,
    ];

    #[test]
    fn modulus_from_certificate() {
        let der = certificate(&MODULUS);
        assert_eq!(certificate_rsa_modulus(&der), Some(MODULUS.to_vec()));
    }

    #[test]
    fn modulus_from_pkcs1_key() {
        let der = pkcs1_key(&MODULUS);
        assert_eq!(private_key_rsa_modulus(&der), Some(MODULUS.to_vec()));
    }

    #[test]
    fn modulus_from_pkcs8_key() {
        let der = pkcs8_key(&MODULUS);
        assert_eq!(private_key_rsa_modulus(&der), Some(MODULUS.to_vec()));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(certificate_rsa_modulus(b"not der at all"), None);
        assert_eq!(private_key_rsa_modulus(&[0x30]), None);
        assert_eq!(private_key_rsa_modulus(&[]), None);
    }

    #[test]
    fn truncated_certificate_is_none() {
        let der = certificate(&MODULUS);
        assert_eq!(certificate_rsa_modulus(&der[..der.len() / 2]), None);
    }
}
