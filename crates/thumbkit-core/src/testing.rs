//! Test doubles and fixtures shared by the unit tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;

use crate::codec::{
    scaled_len, shrunk_len, Area, Codec, CodecError, DestOptions, FormatTag, ImageHandle,
    Rotation, SourceOptions,
};
use crate::metadata::{
    ExifStore, MetadataDocument, MetadataError, MetadataStore, TagReading,
};

// ---------------------------------------------------------------------------
// Mock codec
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    created: AtomicUsize,
}

/// Tracks one live image handle.
#[derive(Debug)]
struct LiveGuard(Arc<Counters>);

impl LiveGuard {
    fn new(counters: &Arc<Counters>) -> Self {
        counters.live.fetch_add(1, Ordering::SeqCst);
        counters.created.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counters))
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An image that only knows its size.
#[derive(Debug)]
pub(crate) struct MockImage {
    width: u32,
    height: u32,
    _guard: LiveGuard,
}

impl ImageHandle for MockImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug)]
pub(crate) struct MockSink {
    path: PathBuf,
}

/// Pixel operations seen by a [`MockCodec`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockOp {
    Shrink(u32, u32),
    Affine(f64, f64),
    ExtractArea {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },
    Rotate(Rotation),
}

/// Codec that tracks dimensions instead of pixels, counts live handles and
/// can fail on a named operation.
#[derive(Debug)]
pub(crate) struct MockCodec {
    format: FormatTag,
    dimensions: (u32, u32),
    fail_on: Option<&'static str>,
    counters: Arc<Counters>,
    ops: Mutex<Vec<MockOp>>,
    sources: Mutex<Vec<SourceOptions>>,
    destinations: Mutex<Vec<DestOptions>>,
    written: Mutex<Vec<(PathBuf, u32, u32)>>,
}

impl MockCodec {
    pub(crate) fn new(format: FormatTag, width: u32, height: u32) -> Self {
        Self {
            format,
            dimensions: (width, height),
            fail_on: None,
            counters: Arc::default(),
            ops: Mutex::default(),
            sources: Mutex::default(),
            destinations: Mutex::default(),
            written: Mutex::default(),
        }
    }

    /// Fail every call to `operation` (`"probe"`, `"header"`, `"open_read"`,
    /// `"open_write"`, `"shrink"`, `"affine"`, `"extract_area"`, `"rotate"`
    /// or `"write"`).
    pub(crate) fn failing(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub(crate) fn source_dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// A fresh handle of the given size.
    pub(crate) fn image(&self, (width, height): (u32, u32)) -> MockImage {
        MockImage {
            width,
            height,
            _guard: LiveGuard::new(&self.counters),
        }
    }

    pub(crate) fn live_images(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub(crate) fn created_images(&self) -> usize {
        self.counters.created.load(Ordering::SeqCst)
    }

    pub(crate) fn ops(&self) -> Vec<MockOp> {
        self.ops.lock().unwrap().clone()
    }

    pub(crate) fn sources(&self) -> Vec<SourceOptions> {
        self.sources.lock().unwrap().clone()
    }

    pub(crate) fn destinations(&self) -> Vec<DestOptions> {
        self.destinations.lock().unwrap().clone()
    }

    pub(crate) fn written(&self) -> Vec<(PathBuf, u32, u32)> {
        self.written.lock().unwrap().clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), CodecError> {
        if self.fail_on == Some(operation) {
            return Err(CodecError::Io(std::io::Error::other(format!(
                "injected {} failure",
                operation
            ))));
        }
        Ok(())
    }

    fn record(&self, op: MockOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl Codec for MockCodec {
    type Image = MockImage;
    type Sink = MockSink;

    fn probe_format(&self, _path: &Path) -> Result<FormatTag, CodecError> {
        self.check("probe")?;
        Ok(self.format.clone())
    }

    fn header_dimensions(&self, _path: &Path) -> Result<(u32, u32), CodecError> {
        self.check("header")?;
        Ok(self.dimensions)
    }

    fn open_read(&self, source: &SourceOptions) -> Result<MockImage, CodecError> {
        self.check("open_read")?;
        self.sources.lock().unwrap().push(source.clone());
        let (width, height) = self.dimensions;
        Ok(self.image((
            shrunk_len(width, source.load_shrink),
            shrunk_len(height, source.load_shrink),
        )))
    }

    fn open_write(&self, dest: &DestOptions) -> Result<MockSink, CodecError> {
        self.check("open_write")?;
        self.destinations.lock().unwrap().push(dest.clone());
        Ok(MockSink {
            path: dest.path.clone(),
        })
    }

    fn shrink(&self, image: MockImage, x_factor: u32, y_factor: u32) -> Result<MockImage, CodecError> {
        self.check("shrink")?;
        self.record(MockOp::Shrink(x_factor, y_factor));
        let (width, height) = image.dimensions();
        Ok(self.image((shrunk_len(width, x_factor), shrunk_len(height, y_factor))))
    }

    fn affine_bilinear(
        &self,
        image: MockImage,
        x_scale: f64,
        y_scale: f64,
    ) -> Result<MockImage, CodecError> {
        self.check("affine")?;
        self.record(MockOp::Affine(x_scale, y_scale));
        let (width, height) = image.dimensions();
        Ok(self.image((scaled_len(width, x_scale), scaled_len(height, y_scale))))
    }

    fn extract_area(&self, image: MockImage, area: Area) -> Result<MockImage, CodecError> {
        self.check("extract_area")?;
        let (image_width, image_height) = image.dimensions();
        if area.left + area.width > image_width || area.top + area.height > image_height {
            return Err(CodecError::AreaOutOfBounds {
                left: area.left,
                top: area.top,
                width: area.width,
                height: area.height,
                image_width,
                image_height,
            });
        }
        self.record(MockOp::ExtractArea {
            left: area.left,
            top: area.top,
            width: area.width,
            height: area.height,
        });
        Ok(self.image((area.width, area.height)))
    }

    fn rotate(&self, image: MockImage, rotation: Rotation) -> Result<MockImage, CodecError> {
        self.check("rotate")?;
        self.record(MockOp::Rotate(rotation));
        let (width, height) = image.dimensions();
        Ok(self.image(rotation.rotated_dimensions(width, height)))
    }

    fn write(&self, image: &MockImage, sink: MockSink) -> Result<(), CodecError> {
        self.check("write")?;
        let (width, height) = image.dimensions();
        self.written.lock().unwrap().push((sink.path, width, height));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock metadata
// ---------------------------------------------------------------------------

/// In-memory metadata store holding one orientation reading for every path.
#[derive(Debug, Default)]
pub(crate) struct MockMetadata {
    orientation: Option<TagReading>,
    fail_open: bool,
    fail_persist: bool,
    persisted: Arc<Mutex<Vec<(PathBuf, u16)>>>,
}

impl MockMetadata {
    pub(crate) fn with_orientation(reading: TagReading) -> Self {
        Self {
            orientation: Some(reading),
            ..Self::default()
        }
    }

    pub(crate) fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Make every `persist` fail.
    pub(crate) fn persist_fails(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    /// Every `(path, orientation)` written so far.
    pub(crate) fn persisted(&self) -> Vec<(PathBuf, u16)> {
        self.persisted.lock().unwrap().clone()
    }
}

pub(crate) struct MockDocument {
    path: PathBuf,
    orientation: Option<TagReading>,
    staged: Option<u16>,
    fail_persist: bool,
    persisted: Arc<Mutex<Vec<(PathBuf, u16)>>>,
}

impl MetadataStore for MockMetadata {
    type Document = MockDocument;

    fn open(&self, path: &Path) -> Result<MockDocument, MetadataError> {
        if self.fail_open {
            return Err(MetadataError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("injected open failure"),
            });
        }
        Ok(MockDocument {
            path: path.to_path_buf(),
            orientation: self.orientation.clone(),
            staged: None,
            fail_persist: self.fail_persist,
            persisted: Arc::clone(&self.persisted),
        })
    }
}

impl MetadataDocument for MockDocument {
    fn read_tag(&self, tag: Tag) -> Option<TagReading> {
        if tag == Tag::Orientation {
            self.orientation.clone()
        } else {
            None
        }
    }

    fn set_tag(&mut self, tag: Tag, value: u16) {
        if tag == Tag::Orientation {
            self.staged = Some(value);
        }
    }

    fn persist(self) -> Result<(), MetadataError> {
        if self.fail_persist {
            return Err(MetadataError::UnsupportedContainer(self.path));
        }
        if let Some(value) = self.staged {
            self.persisted.lock().unwrap().push((self.path, value));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File fixtures
// ---------------------------------------------------------------------------

/// Serialize primary-IFD fields into a big-endian EXIF block.
pub(crate) fn exif_block(fields: Vec<Field>) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut out = Cursor::new(Vec::new());
    writer.write(&mut out, false).unwrap();
    out.into_inner()
}

/// EXIF block holding only an orientation SHORT.
pub(crate) fn orientation_exif(raw: u16) -> Vec<u8> {
    exif_block(vec![Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![raw]),
    }])
}

/// Asymmetric gradient, so rotations are observable in the pixels.
pub(crate) fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

fn write_fixture(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    format: ImageFormat,
    exif: Option<Vec<u8>>,
) -> PathBuf {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();

    if let Some(exif) = exif {
        bytes = match format {
            ImageFormat::Jpeg => {
                let mut jpeg = Jpeg::from_bytes(bytes.into()).unwrap();
                jpeg.set_exif(Some(exif.into()));
                jpeg.encoder().bytes().to_vec()
            }
            ImageFormat::Png => {
                let mut png = Png::from_bytes(bytes.into()).unwrap();
                png.set_exif(Some(exif.into()));
                png.encoder().bytes().to_vec()
            }
            other => panic!("no EXIF support for {:?}", other),
        };
    }

    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Write a JPEG fixture, optionally carrying an EXIF block.
pub(crate) fn write_jpeg(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    exif: Option<Vec<u8>>,
) -> PathBuf {
    write_fixture(dir, name, width, height, ImageFormat::Jpeg, exif)
}

/// Write a PNG fixture, optionally carrying an EXIF block.
pub(crate) fn write_png(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    exif: Option<Vec<u8>>,
) -> PathBuf {
    write_fixture(dir, name, width, height, ImageFormat::Png, exif)
}

/// The raw orientation values stored in a file, read back through [`ExifStore`].
pub(crate) fn read_orientation(path: &Path) -> Option<Vec<u32>> {
    ExifStore
        .open(path)
        .unwrap()
        .read_tag(Tag::Orientation)
        .map(|reading| reading.values)
}
