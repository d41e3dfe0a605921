//! [`MetadataStore`] over the EXIF block of JPEG and PNG files.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use exif::experimental::Writer;
use exif::{Context, Field, In, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;

use super::tiff::patch_ifd0_short;
use super::{MetadataDocument, MetadataError, MetadataStore, TagReading};

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Opens EXIF documents through `img-parts` and `kamadak-exif`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifStore;

#[derive(Debug)]
enum Container {
    Jpeg(Jpeg),
    Png(Png),
    /// A format with no EXIF support; reads see no tags.
    Opaque,
}

impl Container {
    fn parse(data: Bytes) -> Result<Self, MetadataError> {
        if data.starts_with(JPEG_MAGIC) {
            Ok(Container::Jpeg(Jpeg::from_bytes(data)?))
        } else if data.starts_with(PNG_MAGIC) {
            Ok(Container::Png(Png::from_bytes(data)?))
        } else {
            Ok(Container::Opaque)
        }
    }

    fn exif(&self) -> Option<Bytes> {
        match self {
            Container::Jpeg(jpeg) => jpeg.exif(),
            Container::Png(png) => png.exif(),
            Container::Opaque => None,
        }
    }
}

/// The EXIF block of one file, with any staged tag changes.
pub struct ExifDocument {
    path: PathBuf,
    container: Container,
    raw: Option<Bytes>,
    parsed: Option<exif::Exif>,
    staged: Vec<(Tag, u16)>,
}

// `exif::Exif` has no Debug impl; show the block size instead.
impl fmt::Debug for ExifDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExifDocument")
            .field("path", &self.path)
            .field("container", &self.container)
            .field("exif_len", &self.raw.as_ref().map(Bytes::len))
            .field("staged", &self.staged)
            .finish_non_exhaustive()
    }
}

impl MetadataStore for ExifStore {
    type Document = ExifDocument;

    fn open(&self, path: &Path) -> Result<ExifDocument, MetadataError> {
        let data = std::fs::read(path).map_err(MetadataError::io(path))?;
        let container = Container::parse(Bytes::from(data))?;
        let raw = container.exif();
        let parsed = match &raw {
            Some(raw) => Some(exif::Reader::new().read_raw(raw.to_vec())?),
            None => None,
        };

        tracing::trace!(path = %path.display(), has_exif = parsed.is_some(), "Opened metadata");

        Ok(ExifDocument {
            path: path.to_path_buf(),
            container,
            raw,
            parsed,
            staged: Vec::new(),
        })
    }
}

impl MetadataDocument for ExifDocument {
    fn read_tag(&self, tag: Tag) -> Option<TagReading> {
        let field = self.parsed.as_ref()?.get_field(tag, In::PRIMARY)?;
        let values = field
            .value
            .iter_uint()
            .map(|values| values.collect())
            .unwrap_or_default();
        Some(TagReading { values })
    }

    fn set_tag(&mut self, tag: Tag, value: u16) {
        self.staged.retain(|(staged, _)| *staged != tag);
        self.staged.push((tag, value));
    }

    fn persist(self) -> Result<(), MetadataError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        if matches!(self.container, Container::Opaque) {
            return Err(MetadataError::UnsupportedContainer(self.path));
        }

        let block = Bytes::from(self.updated_block()?);
        let bytes = match self.container {
            Container::Jpeg(mut jpeg) => {
                jpeg.set_exif(Some(block));
                jpeg.encoder().bytes()
            }
            Container::Png(mut png) => {
                png.set_exif(Some(block));
                png.encoder().bytes()
            }
            Container::Opaque => return Err(MetadataError::UnsupportedContainer(self.path)),
        };

        std::fs::write(&self.path, &bytes).map_err(MetadataError::io(&self.path))?;
        tracing::debug!(path = %self.path.display(), tags = self.staged.len(), "Persisted metadata");
        Ok(())
    }
}

impl ExifDocument {
    /// The EXIF block with all staged values applied.
    fn updated_block(&self) -> Result<Vec<u8>, MetadataError> {
        if let Some(raw) = &self.raw {
            let mut patched = raw.to_vec();
            let in_place = self.staged.iter().all(|(tag, value)| {
                tag.context() == Context::Tiff && patch_ifd0_short(&mut patched, tag.number(), *value)
            });
            if in_place {
                return Ok(patched);
            }
        }
        self.rebuild()
    }

    /// Re-serialize the primary IFD with the staged values. The thumbnail
    /// IFD and fields the writer cannot represent are not carried over.
    fn rebuild(&self) -> Result<Vec<u8>, MetadataError> {
        let replacements: Vec<Field> = self
            .staged
            .iter()
            .map(|&(tag, value)| Field {
                tag,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![value]),
            })
            .collect();

        let mut writer = Writer::new();
        if let Some(parsed) = &self.parsed {
            parsed
                .fields()
                .filter(|field| field.ifd_num == In::PRIMARY)
                .filter(|field| !is_structural(field.tag))
                .filter(|field| !matches!(field.value, Value::Unknown(..)))
                .filter(|field| !self.staged.iter().any(|(tag, _)| *tag == field.tag))
                .for_each(|field| writer.push_field(field));
        }
        for field in &replacements {
            writer.push_field(field);
        }

        let little_endian = self.parsed.as_ref().is_some_and(|parsed| parsed.little_endian());
        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, little_endian)?;
        Ok(out.into_inner())
    }
}

/// Offset and pointer tags the writer derives itself.
fn is_structural(tag: Tag) -> bool {
    [
        Tag::ExifIFDPointer,
        Tag::GPSInfoIFDPointer,
        Tag::InteropIFDPointer,
        Tag::StripOffsets,
        Tag::StripByteCounts,
        Tag::JPEGInterchangeFormat,
        Tag::JPEGInterchangeFormatLength,
    ]
    .contains(&tag)
}
