//! Composite ABI encoding: tuples and arrays, including the head/tail
//! layout for dynamic elements and bool packing.

use crate::abi::{
    ABIError, ABIType, ABIValue, BOOL_FALSE_BYTE, BOOL_TRUE_BYTE, LENGTH_ENCODE_BYTE_SIZE,
};

/// An encoded tuple element before head offsets are resolved.
enum Slot {
    /// Static element bytes, emitted into the head section as-is.
    Fixed(Vec<u8>),
    /// Dynamic element bytes. The head holds a u16 offset to where they
    /// land in the tail section.
    Dynamic(Vec<u8>),
}

pub(crate) fn expect_array(value: &ABIValue) -> Result<&[ABIValue], ABIError> {
    match value {
        ABIValue::Array(values) => Ok(values),
        _ => Err(ABIError::EncodingError {
            message: "ABI value mismatch, expected an array of values".to_string(),
        }),
    }
}

pub(crate) fn encode_static_array(
    child_type: &ABIType,
    size: usize,
    value: &ABIValue,
) -> Result<Vec<u8>, ABIError> {
    let values = expect_array(value)?;
    if values.len() != size {
        return Err(ABIError::EncodingError {
            message: format!(
                "Static array length mismatch, expected {} values, got {}",
                size,
                values.len()
            ),
        });
    }

    encode_elements(&vec![child_type; size], values)
}

pub(crate) fn decode_static_array(
    child_type: &ABIType,
    size: usize,
    bytes: &[u8],
) -> Result<ABIValue, ABIError> {
    decode_elements(&vec![child_type; size], bytes)
}

pub(crate) fn encode_dynamic_array(
    child_type: &ABIType,
    value: &ABIValue,
) -> Result<Vec<u8>, ABIError> {
    let values = expect_array(value)?;

    let mut result = (values.len() as u16).to_be_bytes().to_vec();
    result.extend(encode_elements(&vec![child_type; values.len()], values)?);
    Ok(result)
}

pub(crate) fn decode_dynamic_array(
    child_type: &ABIType,
    bytes: &[u8],
) -> Result<ABIValue, ABIError> {
    if bytes.len() < LENGTH_ENCODE_BYTE_SIZE {
        return Err(ABIError::DecodingError {
            message: "Byte array is too short to be decoded as dynamic array".to_string(),
        });
    }

    // The first 2 bytes hold the element count
    let count = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    decode_elements(&vec![child_type; count], &bytes[LENGTH_ENCODE_BYTE_SIZE..])
}

/// Encodes a sequence of typed values into the ARC-4 head/tail layout.
/// Static elements sit in the head directly; dynamic ones leave a u16
/// offset in the head and append their bytes to the tail. Consecutive bools
/// pack eight to a byte.
pub(crate) fn encode_elements<T>(abi_types: &[T], values: &[ABIValue]) -> Result<Vec<u8>, ABIError>
where
    T: AsRef<ABIType>,
{
    if abi_types.len() != values.len() {
        return Err(ABIError::EncodingError {
            message: "Mismatch lengths between the values and types".to_string(),
        });
    }

    let mut slots: Vec<Slot> = Vec::new();
    let mut cursor = 0;
    while cursor < abi_types.len() {
        let child_type = abi_types[cursor].as_ref();
        if child_type.is_dynamic() {
            slots.push(Slot::Dynamic(child_type.encode(&values[cursor])?));
        } else if matches!(child_type, ABIType::Bool) {
            let end = find_bool_sequence_end(abi_types, cursor);
            slots.push(Slot::Fixed(vec![pack_bools(&values[cursor..=end])?]));
            cursor = end;
        } else {
            slots.push(Slot::Fixed(child_type.encode(&values[cursor])?));
        }
        cursor += 1;
    }

    let head_length: usize = slots
        .iter()
        .map(|slot| match slot {
            Slot::Fixed(head) => head.len(),
            Slot::Dynamic(_) => LENGTH_ENCODE_BYTE_SIZE,
        })
        .sum();

    let mut result = Vec::with_capacity(head_length);
    let mut tail: Vec<u8> = Vec::new();
    for slot in &slots {
        match slot {
            Slot::Fixed(head) => result.extend_from_slice(head),
            Slot::Dynamic(bytes) => {
                let offset = head_length + tail.len();
                let offset = u16::try_from(offset).map_err(|_| ABIError::EncodingError {
                    message: format!("Value {} cannot fit in u16", offset),
                })?;
                result.extend_from_slice(&offset.to_be_bytes());
                tail.extend_from_slice(bytes);
            }
        }
    }

    result.extend(tail);
    Ok(result)
}

pub(crate) fn decode_elements<T>(abi_types: &[T], bytes: &[u8]) -> Result<ABIValue, ABIError>
where
    T: AsRef<ABIType>,
{
    let partitions = extract_values(abi_types, bytes)?;

    let mut values = Vec::with_capacity(abi_types.len());
    for (child_type, partition) in abi_types.iter().zip(&partitions) {
        values.push(child_type.as_ref().decode(partition)?);
    }

    Ok(ABIValue::Array(values))
}

fn pack_bools(values: &[ABIValue]) -> Result<u8, ABIError> {
    if values.len() > 8 {
        return Err(ABIError::EncodingError {
            message: format!(
                "Expected no more than 8 bool values, received {}",
                values.len()
            ),
        });
    }

    let mut packed: u8 = 0;
    for (bit, value) in values.iter().enumerate() {
        let ABIValue::Bool(set) = value else {
            return Err(ABIError::EncodingError {
                message: "Expected all values to be ABIValue::Bool".to_string(),
            });
        };
        if *set {
            packed |= BOOL_TRUE_BYTE >> bit;
        }
    }
    Ok(packed)
}

/// Splits the input into one byte partition per type. Static elements are
/// sliced out of the head directly; dynamic ones are resolved through their
/// head offsets, each running to the next offset (or the end of the input
/// for the last one).
fn extract_values<T>(abi_types: &[T], bytes: &[u8]) -> Result<Vec<Vec<u8>>, ABIError>
where
    T: AsRef<ABIType>,
{
    let mut partitions: Vec<Option<Vec<u8>>> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    let mut cursor = 0usize;

    let mut type_index = 0;
    while type_index < abi_types.len() {
        let child_type = abi_types[type_index].as_ref();
        if child_type.is_dynamic() {
            let pointer = bytes
                .get(cursor..cursor + LENGTH_ENCODE_BYTE_SIZE)
                .ok_or_else(|| ABIError::DecodingError {
                    message: "Byte array is too short to be decoded".to_string(),
                })?;
            let offset = u16::from_be_bytes([pointer[0], pointer[1]]) as usize;
            if offsets.last().is_some_and(|&previous| offset < previous) {
                return Err(ABIError::DecodingError {
                    message: "Dynamic element offsets must not decrease".to_string(),
                });
            }
            offsets.push(offset);
            partitions.push(None);
            cursor += LENGTH_ENCODE_BYTE_SIZE;
        } else if matches!(child_type, ABIType::Bool) {
            let end = find_bool_sequence_end(abi_types, type_index);
            let packed = *bytes.get(cursor).ok_or_else(|| ABIError::DecodingError {
                message: "Byte array is too short to be decoded".to_string(),
            })?;
            for bit in 0..=(end - type_index) {
                let byte = match packed & (BOOL_TRUE_BYTE >> bit) {
                    0 => BOOL_FALSE_BYTE,
                    _ => BOOL_TRUE_BYTE,
                };
                partitions.push(Some(vec![byte]));
            }
            type_index = end;
            cursor += 1;
        } else {
            let size = child_type.byte_size()?;
            let slice =
                bytes
                    .get(cursor..cursor + size)
                    .ok_or_else(|| ABIError::DecodingError {
                        message: format!(
                            "Index out of bounds: trying to access bytes[{}..{}] but slice has length {}",
                            cursor,
                            cursor + size,
                            bytes.len()
                        ),
                    })?;
            partitions.push(Some(slice.to_vec()));
            cursor += size;
        }

        if type_index != abi_types.len() - 1 && cursor >= bytes.len() {
            return Err(ABIError::DecodingError {
                message: "Input bytes not enough to decode".to_string(),
            });
        }
        type_index += 1;
    }

    if offsets.is_empty() {
        if cursor < bytes.len() {
            return Err(ABIError::DecodingError {
                message: "Input bytes not fully consumed".to_string(),
            });
        }
    } else if u16::try_from(bytes.len()).is_err() {
        return Err(ABIError::DecodingError {
            message: format!("Value {} cannot fit in u16", bytes.len()),
        });
    }

    let mut segment = 0usize;
    for (index, child_type) in abi_types.iter().enumerate() {
        if !child_type.as_ref().is_dynamic() {
            continue;
        }
        let start = offsets[segment];
        let end = offsets.get(segment + 1).copied().unwrap_or(bytes.len());
        let slice = bytes
            .get(start..end)
            .ok_or_else(|| ABIError::DecodingError {
                message: "Dynamic element offset points past the end of the input".to_string(),
            })?;
        partitions[index] = Some(slice.to_vec());
        segment += 1;
    }

    partitions
        .into_iter()
        .enumerate()
        .map(|(i, partition)| {
            partition.ok_or_else(|| ABIError::DecodingError {
                message: format!("Value partition at index {} is None", i),
            })
        })
        .collect()
}

/// The last index of the run of consecutive bools starting at `start`.
/// Runs are capped at 8, the number that pack into one byte.
pub(crate) fn find_bool_sequence_end<T>(abi_types: &[T], start: usize) -> usize
where
    T: AsRef<ABIType>,
{
    let mut end = start;
    while end + 1 < abi_types.len()
        && end - start + 1 < 8
        && matches!(abi_types[end + 1].as_ref(), ABIType::Bool)
    {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use crate::abi::{ABIType, ABIValue, BitSize};
    use num_bigint::BigUint;

    #[test]
    fn test_wrong_value_length() {
        let tuple_type = ABIType::Tuple(vec![
            ABIType::Uint(BitSize::new(32).unwrap()),
            ABIType::Uint(BitSize::new(32).unwrap()),
        ]);

        let value = ABIValue::Array(vec![ABIValue::Uint(BigUint::from(1u32))]);
        let result = tuple_type.encode(&value);

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "ABI encoding failed: Mismatch lengths between the values and types"
        );
    }

    #[test]
    fn test_decode_malformed_tuple_insufficient_bytes() {
        let tuple_type = ABIType::Tuple(vec![
            ABIType::Uint(BitSize::new(32).unwrap()),
            ABIType::Uint(BitSize::new(32).unwrap()),
        ]);
        let bytes = vec![0x00, 0x00, 0x00];
        let result = tuple_type.decode(&bytes);

        assert!(result.is_err());
    }

    #[test]
    fn test_decode_malformed_tuple_extra_bytes() {
        let tuple_type = ABIType::Tuple(vec![ABIType::Uint(BitSize::new(8).unwrap())]);
        let bytes = vec![0x01, 0x02, 0x03];
        let result = tuple_type.decode(&bytes);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Input bytes not fully consumed")
        );
    }

    #[test]
    fn test_static_array_length_mismatch() {
        let array_type = ABIType::StaticArray(Box::new(ABIType::Byte), 3);
        let value = ABIValue::Array(vec![ABIValue::Byte(1), ABIValue::Byte(2)]);

        let result = array_type.encode(&value);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Static array length mismatch")
        );
    }

    #[test]
    fn test_bool_runs_longer_than_eight_use_second_byte() {
        let types: Vec<ABIType> = vec![ABIType::Bool; 10];
        let tuple_type = ABIType::Tuple(types);
        let value = ABIValue::Array(vec![ABIValue::Bool(true); 10]);

        let encoded = tuple_type.encode(&value).unwrap();
        assert_eq!(encoded, vec![0xff, 0xc0]);
        assert_eq!(tuple_type.decode(&encoded).unwrap(), value);
    }
}
