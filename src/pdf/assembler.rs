use anyhow::{anyhow, bail, Context, Result};
use lopdf::{dictionary, Document, Object, Stream};

use crate::capture::CapturedPage;
use crate::errors::PrintError;

/// Builds the PDF off the async runtime; bytes are only returned once every
/// page has been added.
pub async fn assemble(pages: Vec<CapturedPage>) -> Result<Vec<u8>, PrintError> {
    tokio::task::spawn_blocking(move || assemble_pdf(&pages))
        .await
        .map_err(|err| PrintError::Internal(format!("pdf worker join failed: {err}")))?
        .map_err(PrintError::AssemblyFailure)
}

/// One page per capture, each exactly as large as its image in pixels, with
/// the image filling the page edge to edge.
pub fn assemble_pdf(pages: &[CapturedPage]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        bail!("no pages to assemble");
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        if page.ordinal as usize != index {
            bail!("page {} arrived at position {index}", page.ordinal);
        }

        let img = image::load_from_memory(&page.image_buffer)
            .with_context(|| format!("failed to decode page {}", page.ordinal))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("page {} has an empty image", page.ordinal));
        }
        let (width, height) = (i64::from(width), i64::from(height));

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            img.into_raw(),
        ));

        let image_name = format!("Im{}", index + 1);
        let content = format!("q {width} 0 0 {height} 0 0 cm /{image_name} Do Q\n").into_bytes();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    image_name => image_id,
                },
            },
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).context("failed to serialise PDF")?;
    Ok(out)
}
