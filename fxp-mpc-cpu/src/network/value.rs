use eyre::{bail, eyre, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::mem::size_of;

/// Value sent over the network
#[derive(PartialEq, Clone, Debug)]
pub enum NetworkValue {
    VecU8(Vec<u8>),
    VecRing64(Vec<u64>),
    VecRing128(Vec<u128>),
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum DescriptorByte {
    VecU8 = 0x02,
    VecRing64 = 0x08,
    VecRing128 = 0x0B,
}

/// Descriptor byte plus the `u32` payload length.
const HEADER_LEN: usize = 5;

impl NetworkValue {
    fn descriptor_byte(&self) -> DescriptorByte {
        match self {
            NetworkValue::VecU8(_) => DescriptorByte::VecU8,
            NetworkValue::VecRing64(_) => DescriptorByte::VecRing64,
            NetworkValue::VecRing128(_) => DescriptorByte::VecRing128,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            NetworkValue::VecU8(v) => v.len(),
            NetworkValue::VecRing64(v) => size_of::<u64>() * v.len(),
            NetworkValue::VecRing128(v) => size_of::<u128>() * v.len(),
        }
    }

    pub fn to_network(&self) -> Vec<u8> {
        let payload_len = self.payload_len();
        let mut res = Vec::with_capacity(HEADER_LEN + payload_len);
        res.push(self.descriptor_byte().into());
        res.extend_from_slice(&(payload_len as u32).to_le_bytes());
        match self {
            NetworkValue::VecU8(v) => res.extend_from_slice(v),
            NetworkValue::VecRing64(v) => {
                for x in v {
                    res.extend_from_slice(&x.to_le_bytes());
                }
            }
            NetworkValue::VecRing128(v) => {
                for x in v {
                    res.extend_from_slice(&x.to_le_bytes());
                }
            }
        }
        res
    }

    pub fn from_network_slice(serialized: &[u8]) -> Result<Self> {
        if serialized.is_empty() {
            bail!("Empty serialized data");
        }
        let descriptor_byte = DescriptorByte::try_from(serialized[0])
            .map_err(|_| eyre!("Invalid network value type {:#04x}", serialized[0]))?;
        if serialized.len() < HEADER_LEN {
            bail!("Can't parse vector length: buffer too short");
        }
        let len = u32::from_le_bytes(<[u8; 4]>::try_from(&serialized[1..HEADER_LEN])?) as usize;
        if serialized.len() != HEADER_LEN + len {
            bail!(
                "Invalid length for {:?}: length mismatch {} but expected {}",
                descriptor_byte,
                serialized.len(),
                HEADER_LEN + len
            );
        }
        let payload = &serialized[HEADER_LEN..];
        match descriptor_byte {
            DescriptorByte::VecU8 => Ok(NetworkValue::VecU8(payload.to_vec())),
            DescriptorByte::VecRing64 => Ok(NetworkValue::VecRing64(get_vec_elements::<u64, 8, _>(
                payload,
                u64::from_le_bytes,
            )?)),
            DescriptorByte::VecRing128 => Ok(NetworkValue::VecRing128(
                get_vec_elements::<u128, 16, _>(payload, u128::from_le_bytes)?,
            )),
        }
    }

    /// Packs words of `bitwidth` bits into the narrowest wire variant.
    pub fn from_words(words: Vec<u128>, bitwidth: u32) -> Self {
        if bitwidth <= 64 {
            NetworkValue::VecRing64(words.into_iter().map(|w| w as u64).collect())
        } else {
            NetworkValue::VecRing128(words)
        }
    }

    /// Inverse of [`NetworkValue::from_words`]; checks the variant and length.
    pub fn into_words(self, bitwidth: u32, expected_len: usize) -> Result<Vec<u128>> {
        let words: Vec<u128> = match (self, bitwidth <= 64) {
            (NetworkValue::VecRing64(v), true) => v.into_iter().map(u128::from).collect(),
            (NetworkValue::VecRing128(v), false) => v,
            (other, _) => bail!(
                "Unexpected {:?} for a {}-bit payload",
                other.descriptor_byte(),
                bitwidth
            ),
        };
        if words.len() != expected_len {
            bail!(
                "Expected {} words, received {}",
                expected_len,
                words.len()
            );
        }
        Ok(words)
    }

    pub fn into_bytes(self, expected_len: usize) -> Result<Vec<u8>> {
        match self {
            NetworkValue::VecU8(v) if v.len() == expected_len => Ok(v),
            NetworkValue::VecU8(v) => {
                bail!("Expected {} bytes, received {}", expected_len, v.len())
            }
            other => Err(eyre!(
                "Invalid conversion of {:?} to bytes",
                other.descriptor_byte()
            )),
        }
    }
}

fn get_vec_elements<T, const N: usize, F>(payload: &[u8], from_bytes: F) -> Result<Vec<T>>
where
    F: Fn([u8; N]) -> T,
{
    if payload.len() % N != 0 {
        bail!(
            "invalid length for VecRing{}: length {} does not divide type length {}",
            N * 8,
            payload.len(),
            N
        );
    }
    payload
        .chunks_exact(N)
        .map(|chunk| Ok(from_bytes(<[u8; N]>::try_from(chunk)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() -> Result<()> {
        let value = NetworkValue::VecRing64(vec![1, u64::MAX]);
        let bytes = value.to_network();
        assert_eq!(bytes[0], 0x08);
        assert_eq!(&bytes[1..5], &16u32.to_le_bytes());
        assert_eq!(bytes[5], 1);
        assert_eq!(NetworkValue::from_network_slice(&bytes)?, value);

        let wide = NetworkValue::VecRing128(vec![1 << 100]);
        assert_eq!(NetworkValue::from_network_slice(&wide.to_network())?, wide);
        Ok(())
    }

    #[test]
    fn test_from_network_empty() -> Result<()> {
        let result = NetworkValue::from_network_slice(&[]);
        assert_eq!(result.unwrap_err().to_string(), "Empty serialized data");
        Ok(())
    }

    #[test]
    fn test_from_network_malformed() {
        assert!(NetworkValue::from_network_slice(&[0x7F, 0, 0, 0, 0]).is_err());
        // declared length does not match the payload
        assert!(NetworkValue::from_network_slice(&[0x08, 8, 0, 0, 0, 1]).is_err());
        // not a multiple of the element size
        assert!(NetworkValue::from_network_slice(&[0x08, 3, 0, 0, 0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_words_pick_wire_width() -> Result<()> {
        let narrow = NetworkValue::from_words(vec![3, 5], 40);
        assert!(matches!(narrow, NetworkValue::VecRing64(_)));
        assert_eq!(narrow.into_words(40, 2)?, vec![3, 5]);

        let wide = NetworkValue::from_words(vec![1 << 70], 72);
        assert!(matches!(wide, NetworkValue::VecRing128(_)));
        assert!(wide.clone().into_words(40, 1).is_err());
        assert!(wide.into_words(72, 2).is_err());
        Ok(())
    }
}
