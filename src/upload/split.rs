//! Part splitter
//!
//! Partitions one owned payload into ordered, non-overlapping chunks.
//! Chunks are `Bytes` views into the same buffer, nothing is copied.
//! An empty payload yields no chunks.

use bytes::Bytes;

/// One part of a multipart payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based, follows payload order
    pub part_number: u32,
    pub bytes: Bytes,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `ceil(len / chunk_size)`
pub fn total_parts(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size.max(1))
}

/// Split `payload` into `chunk_size` pieces; the last one may be shorter
pub fn split_parts(payload: &Bytes, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let count = total_parts(payload.len(), chunk_size);

    (0..count)
        .map(|index| {
            let start = index * chunk_size;
            let end = (start + chunk_size).min(payload.len());
            Chunk {
                part_number: index as u32 + 1,
                bytes: payload.slice(start..end),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PART_SIZE;

    const MIB: usize = 1024 * 1024;

    fn payload(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>())
    }

    fn assert_partition(len: usize, chunk_size: usize) {
        let data = payload(len);
        let chunks = split_parts(&data, chunk_size);

        assert_eq!(chunks.len(), len.div_ceil(chunk_size));

        let numbers: Vec<u32> = chunks.iter().map(|c| c.part_number).collect();
        let expected: Vec<u32> = (1..=chunks.len() as u32).collect();
        assert_eq!(numbers, expected);

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.bytes.iter().copied()).collect();
        assert_eq!(joined, data.to_vec());

        for chunk in chunks.iter().take(chunks.len().saturating_sub(1)) {
            assert_eq!(chunk.len(), chunk_size);
        }
    }

    #[test]
    fn test_empty_payload_has_no_chunks() {
        assert!(split_parts(&Bytes::new(), DEFAULT_PART_SIZE).is_empty());
        assert_eq!(total_parts(0, DEFAULT_PART_SIZE), 0);
    }

    #[test]
    fn test_twelve_mib_splits_five_five_two() {
        let chunks = split_parts(&payload(12 * MIB), DEFAULT_PART_SIZE);
        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, vec![5 * MIB, 5 * MIB, 2 * MIB]);
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let chunks = split_parts(&payload(10 * MIB), DEFAULT_PART_SIZE);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 5 * MIB));
    }

    #[test]
    fn test_small_payload_is_single_chunk() {
        let chunks = split_parts(&payload(1), DEFAULT_PART_SIZE);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].part_number, 1);
    }

    #[test]
    fn test_partition_properties() {
        for (len, chunk_size) in [(1, 1), (7, 3), (9, 3), (100, 7), (1000, 1000), (1001, 1000)] {
            assert_partition(len, chunk_size);
        }
    }

    #[test]
    fn test_chunks_share_payload_buffer() {
        let data = payload(10);
        let chunks = split_parts(&data, 4);
        assert_eq!(chunks[1].bytes.as_ptr(), data[4..].as_ptr());
    }
}
