use super::types::PdfError;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeSet;

/// Page attributes a page may take from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` links in damaged files
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))
}

pub(crate) fn save(mut doc: Document) -> Result<Vec<u8>, PdfError> {
    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Operation(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

pub(crate) fn operation_error(err: lopdf::Error) -> PdfError {
    PdfError::Operation(err.to_string())
}

/// Looks a page attribute up on the page, then on its ancestors
pub(crate) fn page_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Copies inherited attributes onto every page so pages can be moved to
/// another page tree without changing how they render
fn inline_inherited_attributes(doc: &mut Document) -> Result<(), PdfError> {
    for page_id in doc.get_pages().into_values() {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE_KEYS
            .iter()
            .filter_map(|&key| page_attribute(doc, page_id, key).map(|value| (key, value)))
            .collect();

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(operation_error)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
    Ok(())
}

/// Number of pages in a document
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfError> {
    Ok(load(bytes)?.get_pages().len() as u32)
}

/// Parses a page list like `"1-3, 5, 8-10"` into sorted unique page numbers.
///
/// Empty items are ignored. Page 0 and reversed ranges are rejected.
pub fn parse_ranges(input: &str) -> Result<Vec<u32>, PdfError> {
    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let parse = |text: &str| {
            text.trim()
                .parse::<u32>()
                .ok()
                .filter(|&page| page > 0)
                .ok_or_else(|| PdfError::InvalidRange(format!("Invalid page: {}", text.trim())))
        };

        if let Some((start, end)) = part.split_once('-') {
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(PdfError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }
            pages.extend(start..=end);
        } else {
            pages.insert(parse(part)?);
        }
    }

    Ok(pages.into_iter().collect())
}

/// Merges documents into one, keeping every page in input order.
///
/// The first document becomes the base. Objects of each following document
/// are renumbered past the highest id in use, then its pages are appended to
/// the base's root page list. Inherited page attributes are copied onto the
/// pages first, since intermediate page tree nodes are dropped.
///
/// # Errors
/// * `PdfError::InvalidParams` if no documents are given
/// * `PdfError::Parse` if any input is not a PDF
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    if documents.is_empty() {
        return Err(PdfError::InvalidParams("No documents to merge".to_string()));
    }

    let mut loaded = Vec::with_capacity(documents.len());
    for (index, bytes) in documents.iter().enumerate() {
        let mut doc = load(bytes).map_err(|e| {
            PdfError::Parse(format!("Document {}: {}", index + 1, e))
        })?;
        inline_inherited_attributes(&mut doc)?;
        loaded.push(doc);
    }

    let mut dest = loaded.remove(0);
    let mut page_refs: Vec<ObjectId> = dest.get_pages().into_values().collect();
    let mut max_id = dest.max_id;

    for source in loaded {
        let offset = max_id;
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();

        dest.objects.extend(
            source
                .objects
                .into_iter()
                .map(|(id, object)| ((id.0 + offset, id.1), remap_references(object, offset))),
        );

        page_refs.extend(source_pages.into_iter().map(|id| (id.0 + offset, id.1)));
        max_id = max_id.max(source.max_id + offset);
    }

    dest.max_id = max_id;
    replace_page_list(&mut dest, &page_refs)?;

    tracing::debug!(
        "Merged {} documents into {} pages",
        documents.len(),
        page_refs.len()
    );
    save(dest)
}

fn remap_references(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| remap_references(item, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_references(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_references(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Points the catalog's root page node at exactly `page_refs`
fn replace_page_list(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfError> {
    let pages_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|root| doc.get_dictionary(root))
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| PdfError::Operation(format!("No page tree: {}", e)))?;

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(operation_error)?;
    pages.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_refs.len() as i64));

    for &page_id in page_refs {
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(operation_error)?
            .set("Parent", Object::Reference(pages_id));
    }
    Ok(())
}

/// Keeps only the given 1-based pages, in document order.
///
/// Duplicates are ignored.
///
/// # Errors
/// * `PdfError::InvalidRange` if the list is empty or names a page the document does not have
pub fn extract_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<u8>, PdfError> {
    if pages.is_empty() {
        return Err(PdfError::InvalidRange("No pages selected".to_string()));
    }
    if pages.contains(&0) {
        return Err(PdfError::InvalidRange(
            "Page numbers start at 1".to_string(),
        ));
    }

    let mut doc = load(bytes)?;
    let page_count = doc.get_pages().len() as u32;

    if let Some(&missing) = pages.iter().find(|&&page| page > page_count) {
        return Err(PdfError::InvalidRange(format!(
            "Page {} does not exist (document has {} pages)",
            missing, page_count
        )));
    }

    let keep: BTreeSet<u32> = pages.iter().copied().collect();
    // Delete from the back so earlier page numbers stay valid
    for page in (1..=page_count).rev().filter(|page| !keep.contains(page)) {
        doc.delete_pages(&[page]);
    }

    tracing::debug!("Extracted {} of {} pages", keep.len(), page_count);
    save(doc)
}
