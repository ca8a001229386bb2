use super::*;
use serde_json::json;

#[test]
fn record_ids_are_deterministic() {
    let first = StoredRecord::new("policy.pdf", 3, "text".to_string(), vec![0.1]);
    let second = StoredRecord::new("policy.pdf", 3, "other text".to_string(), vec![0.2]);

    assert_eq!(first.id, "policy.pdf_3");
    assert_eq!(first.id, second.id);
    assert_eq!(first.metadata.chunk_id, 3);
    assert_eq!(first.metadata.source, "policy.pdf");
}

#[test]
fn record_serializes_with_metadata() {
    let record = StoredRecord::new("handbook.docx", 0, "Leave rules".to_string(), vec![0.5, 0.25]);

    let value = serde_json::to_value(&record).expect("record should serialize");

    assert_eq!(
        value,
        json!({
            "id": "handbook.docx_0",
            "values": [0.5, 0.25],
            "metadata": { "text": "Leave rules", "source": "handbook.docx", "chunk_id": 0 }
        })
    );
}

#[test]
fn chunk_id_accepts_float_encoding() {
    let parsed: QueryMatch = serde_json::from_value(json!({
        "id": "policy.pdf_2",
        "score": 0.81,
        "metadata": { "text": "t", "source": "policy.pdf", "chunk_id": 2.0 }
    }))
    .expect("match should parse");

    assert_eq!(parsed.metadata.map(|m| m.chunk_id), Some(2));
}

#[test]
fn chunk_id_rejects_fractions() {
    let parsed: Result<RecordMetadata, _> =
        serde_json::from_value(json!({ "text": "t", "source": "s", "chunk_id": 1.5 }));

    assert!(parsed.is_err());
}
