//! Post-processing of a serialized label sheet.
//!
//! Every placed cell embeds its own copy of the barcode image, so a product
//! printed N times carries N identical image streams. Compaction points every
//! reference at the first copy, drops the rest and deflates the remaining
//! streams.

use std::collections::HashMap;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::errors::LabelError;

/// Rewrites `bytes` with identical images stored once and streams compressed.
pub fn compact_document(bytes: &[u8]) -> Result<Vec<u8>, LabelError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| LabelError::Pdf(e.to_string()))?;

    let duplicates = duplicate_images(&doc);
    if !duplicates.is_empty() {
        for object in doc.objects.values_mut() {
            redirect(object, &duplicates);
        }
        doc.prune_objects();
    }
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| LabelError::Pdf(e.to_string()))?;
    debug!(
        shared_images = duplicates.len(),
        before = bytes.len(),
        after = out.len(),
        "Compacted label sheet"
    );
    Ok(out)
}

/// Maps each repeated image stream to the lowest-numbered identical one.
fn duplicate_images(doc: &Document) -> HashMap<ObjectId, ObjectId> {
    let mut first_seen: HashMap<(String, &[u8]), ObjectId> = HashMap::new();
    let mut duplicates = HashMap::new();

    for (&id, object) in &doc.objects {
        let Object::Stream(stream) = object else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name_str)
            .is_ok_and(|subtype| subtype == "Image");
        if !is_image {
            continue;
        }

        let key = (format!("{:?}", stream.dict), stream.content.as_slice());
        match first_seen.get(&key) {
            Some(&first) => {
                duplicates.insert(id, first);
            }
            None => {
                first_seen.insert(key, id);
            }
        }
    }
    duplicates
}

fn redirect(object: &mut Object, duplicates: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            if let Some(&first) = duplicates.get(id) {
                *id = first;
            }
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                redirect(item, duplicates);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                redirect(value, duplicates);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                redirect(value, duplicates);
            }
        }
        _ => {}
    }
}
