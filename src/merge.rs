//! Order-preserving concatenation of the per-student documents.
//!
//! Pages are carried over object for object into a fresh id space; nothing
//! gets re-encoded, so the merged file shows exactly what the inputs did.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::status::{SheetError, SheetResult};

/// Concatenates `inputs` into one document at `out`, keeping input order.
pub fn merge(out: &Path, inputs: &[PathBuf]) -> SheetResult<()> {
    if inputs.is_empty() {
        return Err(SheetError::EmptyMerge);
    }
    let mut docs = Vec::with_capacity(inputs.len());
    for p in inputs {
        docs.push(Document::load(p)?);
    }
    let mut merged = merge_documents(docs)?;
    merged.save(out)?;
    debug!("merged {} documents into {}", inputs.len(), out.display());
    Ok(())
}

fn merge_documents(documents: Vec<Document>) -> SheetResult<Document> {
    // Renumber every input into one continuous id space first. Ids grow
    // monotonically across inputs, so iterating the page map below walks
    // the documents in input order.
    let mut max_id = 1;
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, id) in doc.get_pages() {
            let object = doc.get_object(id)?.to_owned();
            pages.insert(id, object);
        }
        objects.append(&mut doc.objects);
    }

    let mut merged = Document::with_version("1.5");

    // One catalog and one page tree survive; everything else is carried
    // over untouched. Pages get re-parented further down.
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for (id, object) in objects {
        let type_name = object
            .as_dict()
            .ok()
            .and_then(|d| d.get(b"Type").ok())
            .and_then(|t| t.as_name().ok())
            .map(<[u8]>::to_vec);

        match type_name.as_deref() {
            Some(b"Catalog") => {
                if catalog.is_none() {
                    if let Ok(dict) = object.as_dict() {
                        catalog = Some((id, dict.clone()));
                    }
                }
            }
            Some(b"Pages") => {
                if let Ok(dict) = object.as_dict() {
                    let mut dict = dict.clone();
                    if let Some((_, ref existing)) = pages_root {
                        dict.extend(existing);
                    }
                    let keep = pages_root.as_ref().map(|(i, _)| *i).unwrap_or(id);
                    pages_root = Some((keep, dict));
                }
            }
            // Handled from the collected page map below.
            Some(b"Page") => {}
            Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) = pages_root.ok_or(SheetError::Malformed("no page tree"))?;
    let (catalog_id, mut catalog_dict) = catalog.ok_or(SheetError::Malformed("no catalog"))?;

    for (id, object) in &pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_id);
            merged.objects.insert(*id, Object::Dictionary(dict));
        }
    }

    pages_dict.set("Count", pages.len() as i64);
    pages_dict.set(
        "Kids",
        pages.keys().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    );
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", pages_id);
    catalog_dict.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    Ok(merged)
}
