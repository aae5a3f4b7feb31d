use aws_smithy_types::Document;
use tag_inventory_core::Tag;

/// Name of the index property carrying a resource's tags.
pub(crate) const TAGS_PROPERTY: &str = "tags";

/// Tags from the data of a `tags` index property: an array of
/// `{"Key": .., "Value": ..}` objects. Entries without a key are skipped; a
/// missing value reads as empty.
pub fn document_to_tags(data: &Document) -> Vec<Tag> {
    let Document::Array(entries) = data else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let Document::Object(fields) = entry else {
                return None;
            };
            let key = match fields.get("Key") {
                Some(Document::String(key)) => key.clone(),
                _ => return None,
            };
            let value = match fields.get("Value") {
                Some(Document::String(value)) => value.clone(),
                _ => String::new(),
            };
            Some(Tag { key, value })
        })
        .collect()
}

/// Region segment of an ARN (`arn:partition:service:region:account:...`).
/// `None` for global resources and malformed ARNs.
pub fn region_of_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts.nth(2).filter(|region| !region.is_empty())
}
