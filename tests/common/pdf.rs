// file: tests/common/pdf.rs
// description: builds small text and scanned PDFs on disk with lopdf

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::path::Path;

/// One embedded image on a scanned page.
#[derive(Debug, Clone, Copy)]
pub enum PageImage {
    /// Uncompressed 8-bit gray samples of the given size.
    Gray { width: u32, height: u32 },
    /// Bytes behind a filter the extractor cannot decode.
    Jpx { width: u32, height: u32 },
    /// Blank Group 4 fax page.
    Fax { width: u32, height: u32 },
}

struct Builder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Builder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn add_page(&mut self, resources: Dictionary, operations: Vec<Operation>) {
        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        self.kids.push(page_id.into());
    }

    fn save(mut self, path: &Path) {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.save(path).unwrap();
    }
}

/// One page per string, each drawn with Helvetica.
pub fn write_text_pdf(path: &Path, pages: &[&str]) {
    let mut builder = Builder::new();
    let font_id = builder.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    for text in pages {
        let resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };
        builder.add_page(
            resources,
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        );
    }

    builder.save(path);
}

/// Pages with no text layer, only the listed images in order.
pub fn write_scanned_pdf(path: &Path, pages: &[Vec<PageImage>]) {
    let mut builder = Builder::new();

    for images in pages {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::new();

        for (i, image) in images.iter().enumerate() {
            let name = format!("Im{}", i + 1);
            let image_id = builder.doc.add_object(image_stream(*image));
            xobjects.set(name.clone(), image_id);

            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![100.into(), 0.into(), 0.into(), 100.into(), 0.into(), 0.into()],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }

        builder.add_page(dictionary! { "XObject" => xobjects }, operations);
    }

    builder.save(path);
}

fn image_stream(image: PageImage) -> Stream {
    let (width, height) = match image {
        PageImage::Gray { width, height }
        | PageImage::Jpx { width, height }
        | PageImage::Fax { width, height } => (width, height),
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
    };

    let data = match image {
        PageImage::Gray { .. } => vec![255u8; (width * height) as usize],
        PageImage::Jpx { .. } => {
            dict.set("Filter", "JPXDecode");
            b"not really jpeg 2000".to_vec()
        }
        PageImage::Fax { .. } => {
            dict.set("Filter", "CCITTFaxDecode");
            dict.set("BitsPerComponent", 1);
            dict.set(
                "DecodeParms",
                dictionary! { "K" => -1, "Columns" => width as i64, "Rows" => height as i64 },
            );
            // one V0 code per all-white row
            vec![0xFF; height.div_ceil(8) as usize]
        }
    };

    Stream::new(dict, data)
}
