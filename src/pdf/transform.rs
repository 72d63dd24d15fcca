use super::pages::{load, operation_error, page_attribute, save};
use super::types::{PageSelection, PageSize, PdfError};
use lopdf::{Dictionary, Object, ObjectId, Stream};

/// Resource name of the form holding a resized page's original content
const PAGE_FORM_NAME: &str = "ResizedPage";

/// Page boxes that describe the old geometry and are dropped on resize
const STALE_BOXES: [&str; 4] = ["CropBox", "BleedBox", "TrimBox", "ArtBox"];

/// US Letter, the page size readers assume when a page has no MediaBox
const FALLBACK_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Checks a rotation and brings it into [0, 360).
///
/// # Errors
/// * `PdfError::InvalidParams` unless `degrees` is a multiple of 90
pub fn normalize_rotation(degrees: i64) -> Result<i64, PdfError> {
    if degrees % 90 != 0 {
        return Err(PdfError::InvalidParams(format!(
            "Rotation must be a multiple of 90 degrees, got {}",
            degrees
        )));
    }
    Ok(degrees.rem_euclid(360))
}

/// Sets the rotation of the selected pages.
///
/// The rotation is absolute: a page already rotated by 90 degrees and set
/// to 180 ends up at 180, not 270.
///
/// # Returns
/// * `Result<Vec<u8>, PdfError>` - The edited document
pub fn rotate_pages(
    bytes: &[u8],
    degrees: i64,
    selection: PageSelection,
) -> Result<Vec<u8>, PdfError> {
    let rotation = normalize_rotation(degrees)?;
    let mut doc = load(bytes)?;

    let mut rotated = 0;
    for (number, page_id) in doc.get_pages() {
        if !selection.contains(number) {
            continue;
        }
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(operation_error)?
            .set("Rotate", Object::Integer(rotation));
        rotated += 1;
    }

    tracing::debug!("Rotated {} page(s) to {} degrees", rotated, rotation);
    save(doc)
}

/// Placement of an old page on a new sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Uniform scale applied to the old page
    pub scale: f32,
    /// Offset of the scaled page's lower-left corner on the sheet
    pub x: f32,
    pub y: f32,
}

/// Fits a `width` x `height` page onto a sheet, centred.
///
/// The page is scaled to fit the sheet on both axes and then by
/// `scale_percent / 100`.
pub fn fit_page(width: f32, height: f32, sheet: PageSize, scale_percent: f32) -> Placement {
    let (sheet_width, sheet_height) = sheet.dimensions();
    let (sheet_width, sheet_height) = (sheet_width as f32, sheet_height as f32);
    let factor = scale_percent / 100.0;

    let scale = (sheet_width / width * factor).min(sheet_height / height * factor);
    Placement {
        scale,
        x: (sheet_width - width * scale) / 2.0,
        y: (sheet_height - height * scale) / 2.0,
    }
}

fn number(object: &Object) -> Option<f32> {
    match *object {
        Object::Integer(value) => Some(value as f32),
        Object::Real(value) => Some(value),
        _ => None,
    }
}

fn media_box(doc: &lopdf::Document, page_id: ObjectId) -> Result<[f32; 4], PdfError> {
    let Some(object) = page_attribute(doc, page_id, b"MediaBox") else {
        return Ok(FALLBACK_MEDIA_BOX);
    };
    let object = match object {
        Object::Reference(id) => doc.get_object(id).map_err(operation_error)?.clone(),
        other => other,
    };

    let values: Vec<f32> = object
        .as_array()
        .map_err(operation_error)?
        .iter()
        .filter_map(number)
        .collect();
    match values[..] {
        [x0, y0, x1, y1] if x1 != x0 && y1 != y0 => {
            Ok([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)])
        }
        _ => Err(PdfError::Operation(format!(
            "Page {:?} has an unusable MediaBox",
            page_id
        ))),
    }
}

/// Puts every page on a new sheet size with its content scaled and centred.
///
/// The old page content becomes a form XObject that the new page draws
/// through a single transform, so fonts, images and vector content are
/// kept as-is. Annotations and the page rotation are dropped because their
/// coordinates refer to the old page.
///
/// # Arguments
/// * `bytes` - The document to resize
/// * `sheet` - New page size
/// * `scale_percent` - Extra scale after fitting, 100 fills the sheet on one axis
///
/// # Errors
/// * `PdfError::InvalidParams` if the scale is not a positive number
pub fn resize_pages(bytes: &[u8], sheet: PageSize, scale_percent: f32) -> Result<Vec<u8>, PdfError> {
    if !scale_percent.is_finite() || scale_percent <= 0.0 {
        return Err(PdfError::InvalidParams(format!(
            "Scale must be a positive percentage, got {}",
            scale_percent
        )));
    }

    let mut doc = load(bytes)?;
    let (sheet_width, sheet_height) = sheet.dimensions();

    for page_id in doc.get_pages().into_values() {
        let [x0, y0, x1, y1] = media_box(&doc, page_id)?;
        let placement = fit_page(x1 - x0, y1 - y0, sheet, scale_percent);

        let content = doc.get_page_content(page_id).map_err(operation_error)?;
        let resources = page_attribute(&doc, page_id, b"Resources")
            .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));

        let mut form = Dictionary::new();
        form.set("Type", Object::Name(b"XObject".to_vec()));
        form.set("Subtype", Object::Name(b"Form".to_vec()));
        form.set(
            "BBox",
            Object::Array(vec![
                Object::Real(x0),
                Object::Real(y0),
                Object::Real(x1),
                Object::Real(y1),
            ]),
        );
        form.set("Resources", resources);
        let form_id = doc.add_object(Stream::new(form, content));

        // The form keeps its own coordinates, so its origin is shifted too
        let draw = format!(
            "q {s:.6} 0 0 {s:.6} {tx:.4} {ty:.4} cm /{name} Do Q",
            s = placement.scale,
            tx = placement.x - x0 * placement.scale,
            ty = placement.y - y0 * placement.scale,
            name = PAGE_FORM_NAME,
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), draw.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set(PAGE_FORM_NAME, Object::Reference(form_id));
        let mut page_resources = Dictionary::new();
        page_resources.set("XObject", Object::Dictionary(xobjects));

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(operation_error)?;
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(sheet_width as i64),
                Object::Integer(sheet_height as i64),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(page_resources));
        page.remove(b"Rotate");
        page.remove(b"Annots");
        for key in STALE_BOXES {
            page.remove(key.as_bytes());
        }
    }

    tracing::debug!(
        "Resized pages to {}x{} pt at {}%",
        sheet_width,
        sheet_height,
        scale_percent
    );
    save(doc)
}
