//! On-disk record layout: `[header length u32 BE][header JSON][object bytes]`.
//!
//! The header holds the object identifier and its metadata, so a single rename publishes
//! both and digest-named files can still be listed by identifier.

use crate::contract::Metadata;
use crate::error::{StorageError, StorageErrorExt};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

const HEADER_LEN: usize = 4;

#[derive(Serialize)]
struct HeaderRef<'a> {
    id: &'a str,
    metadata: &'a Metadata,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Header {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) metadata: Metadata,
}

pub(crate) fn encode(
    id: &str,
    data: &[u8],
    metadata: &Metadata,
) -> Result<Vec<u8>, StorageError> {
    let header =
        serde_json::to_vec(&HeaderRef { id, metadata }).context("Encoding record header")?;
    let header_len = u32::try_from(header.len()).map_err(|_| StorageError::Internal {
        message: "metadata too large".into(),
        context: None,
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + header.len() + data.len());
    out.extend_from_slice(&header_len.to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(data);
    Ok(out)
}

/// Splits a record into its header and payload slice.
pub(crate) fn decode(record: &[u8]) -> Result<(Header, &[u8]), StorageError> {
    let Some((len, rest)) = record.split_first_chunk::<HEADER_LEN>() else {
        return Err(corrupted("record shorter than header"));
    };
    let header_len = u32::from_be_bytes(*len) as usize;
    if header_len > rest.len() {
        return Err(corrupted("header length exceeds record"));
    }

    let (header, data) = rest.split_at(header_len);
    let header = serde_json::from_slice(header).context("Decoding record header")?;
    Ok((header, data))
}

/// Reads only the header of the record at `path`. Blocking.
pub(crate) fn read_header(path: &Path) -> Result<Header, StorageError> {
    let mut file = std::fs::File::open(path).context("Opening record")?;
    let mut len = [0u8; HEADER_LEN];
    file.read_exact(&mut len).map_err(|_| corrupted("record shorter than header"))?;

    let header_len = u32::from_be_bytes(len);
    let mut header = Vec::new();
    file.take(u64::from(header_len))
        .read_to_end(&mut header)
        .context("Reading record header")?;
    if header.len() != header_len as usize {
        return Err(corrupted("header length exceeds record"));
    }
    serde_json::from_slice(&header).context("Decoding record header")
}

fn corrupted(message: &'static str) -> StorageError {
    StorageError::Corrupted { message: message.into(), context: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn truncated_records_are_corrupted() {
        assert!(matches!(decode(&[0, 0]), Err(StorageError::Corrupted { .. })));
        assert!(matches!(decode(&[0, 0, 0, 9, b'{']), Err(StorageError::Corrupted { .. })));
    }

    #[test]
    fn garbage_header_is_a_serialization_error() {
        let record = [0, 0, 0, 2, b'!', b'!', 1, 2, 3];
        assert!(matches!(decode(&record), Err(StorageError::Serialization { .. })));
    }

    #[test]
    fn header_is_readable_without_the_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("r.blob");
        let mut meta = Metadata::new();
        meta.insert("bastion.kind".to_owned(), "key".to_owned());
        std::fs::write(&path, encode("keys/k", &[7u8; 64], &meta).unwrap()).unwrap();

        let header = read_header(&path).unwrap();
        assert_eq!(header.id, "keys/k");
        assert_eq!(header.metadata, meta);

        std::fs::write(&path, [0, 0, 0, 40, b'{']).unwrap();
        assert!(matches!(read_header(&path), Err(StorageError::Corrupted { .. })));
    }

    proptest! {
        #[test]
        fn payload_survives(
            id in "[ -~]{1,40}",
            data in proptest::collection::vec(any::<u8>(), 0..512),
            meta in proptest::collection::btree_map("[a-z.]{1,12}", "[ -~]{0,24}", 0..6),
        ) {
            let record = encode(&id, &data, &meta).unwrap();
            let (header, decoded) = decode(&record).unwrap();
            prop_assert_eq!(decoded, data.as_slice());
            prop_assert_eq!(header.id, id);
            prop_assert_eq!(header.metadata, meta);
        }
    }
}
