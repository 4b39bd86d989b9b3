//! DirectDraw Surface container parsing.
//!
//! Handles the legacy header and the DX10 extension header, block-compressed
//! BC1-BC5/BC7 payloads, 32-bit RGBA/BGRA payloads, mip chains, texture
//! arrays and cube maps. Volume textures are rejected.

use crate::backend::TextureFormat;
use crate::error::DdsError;

const MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;
const DX10_HEADER_LEN: usize = 20;

const DDSD_MIPMAPCOUNT: u32 = 0x0002_0000;
const DDSD_DEPTH: u32 = 0x0080_0000;
const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;
const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_VOLUME: u32 = 0x0020_0000;

/// Direct3D 11 limits for 2D textures
const MAX_DIMENSION: u32 = 16384;
const MAX_ARRAY_SIZE: u32 = 2048;

const DX10_DIMENSION_TEXTURE3D: u32 = 4;
const DX10_MISC_TEXTURECUBE: u32 = 0x4;

/// One mip level of one array layer, borrowed from the container bytes.
#[derive(Debug, Clone, Copy)]
pub struct DdsSurface<'a> {
    pub array_layer: u32,
    pub mip_level: u32,
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

/// A parsed DDS file.
#[derive(Debug, Clone)]
pub struct DdsTexture<'a> {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    /// Array layers, six per cube
    pub array_layers: u32,
    pub is_cube: bool,
    /// Surfaces in file order: every mip of layer 0, then layer 1, ...
    pub surfaces: Vec<DdsSurface<'a>>,
}

impl<'a> DdsTexture<'a> {
    /// Parse a complete DDS file.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DdsError> {
        if bytes.len() < 4 || &bytes[..4] != MAGIC {
            return Err(DdsError::BadMagic);
        }
        let header = Reader::new(bytes, 4);
        require(bytes, 4 + HEADER_SIZE as usize)?;

        let size = header.u32(0);
        if size != HEADER_SIZE {
            return Err(DdsError::BadHeader(size));
        }
        let pf_size = header.u32(72);
        if pf_size != PIXEL_FORMAT_SIZE {
            return Err(DdsError::BadHeader(pf_size));
        }

        let flags = header.u32(4);
        let height = header.u32(8);
        let width = header.u32(12);
        let depth = header.u32(20);
        let mip_count = header.u32(24);
        let pf_flags = header.u32(76);
        let four_cc = header.bytes(80);
        let caps2 = header.u32(108);

        if width == 0 || height == 0 {
            return Err(DdsError::ZeroSize);
        }
        for (what, value) in [("width", width), ("height", height)] {
            if value > MAX_DIMENSION {
                return Err(DdsError::TooLarge { what, value });
            }
        }
        if caps2 & DDSCAPS2_VOLUME != 0 || (flags & DDSD_DEPTH != 0 && depth > 1) {
            return Err(DdsError::VolumeTexture);
        }

        let mut offset = 4 + HEADER_SIZE as usize;
        let mut is_cube = caps2 & DDSCAPS2_CUBEMAP != 0;
        let mut array_size = 1;

        let format = if pf_flags & DDPF_FOURCC != 0 && &four_cc == b"DX10" {
            require(bytes, offset + DX10_HEADER_LEN)?;
            let dx10 = Reader::new(bytes, offset);
            offset += DX10_HEADER_LEN;

            if dx10.u32(4) == DX10_DIMENSION_TEXTURE3D {
                return Err(DdsError::VolumeTexture);
            }
            if dx10.u32(8) & DX10_MISC_TEXTURECUBE != 0 {
                is_cube = true;
            }
            array_size = dx10.u32(12).max(1);
            if array_size > MAX_ARRAY_SIZE {
                return Err(DdsError::TooLarge {
                    what: "array size",
                    value: array_size,
                });
            }
            dxgi_format(dx10.u32(0))?
        } else if pf_flags & DDPF_FOURCC != 0 {
            four_cc_format(&four_cc)?
        } else if pf_flags & DDPF_RGB != 0 {
            let bit_count = header.u32(84);
            let masks = [header.u32(88), header.u32(92), header.u32(96), header.u32(100)];
            let has_alpha = pf_flags & DDPF_ALPHAPIXELS != 0;
            rgb_format(bit_count, masks, has_alpha)?
        } else {
            return Err(DdsError::UnsupportedFormat(format!(
                "pixel format flags {pf_flags:#x}"
            )));
        };

        let max_mips = 32 - width.max(height).leading_zeros();
        let mip_levels = if flags & DDSD_MIPMAPCOUNT != 0 && mip_count > 0 {
            mip_count.min(max_mips)
        } else {
            1
        };
        let array_layers = if is_cube { array_size * 6 } else { array_size };

        let mip_extent = |mip: u32| ((width >> mip).max(1), (height >> mip).max(1));
        let layer_len: usize = (0..mip_levels)
            .map(|mip| {
                let (w, h) = mip_extent(mip);
                format.surface_size(w, h)
            })
            .sum();
        let payload_end = layer_len
            .checked_mul(array_layers as usize)
            .and_then(|len| len.checked_add(offset))
            .ok_or(DdsError::TooLarge {
                what: "array size",
                value: array_size,
            })?;
        require(bytes, payload_end)?;

        let mut surfaces = Vec::with_capacity((array_layers * mip_levels) as usize);
        for layer in 0..array_layers {
            for mip in 0..mip_levels {
                let (w, h) = mip_extent(mip);
                let len = format.surface_size(w, h);
                surfaces.push(DdsSurface {
                    array_layer: layer,
                    mip_level: mip,
                    width: w,
                    height: h,
                    data: &bytes[offset..offset + len],
                });
                offset += len;
            }
        }

        Ok(Self {
            format,
            width,
            height,
            mip_levels,
            array_layers,
            is_cube,
            surfaces,
        })
    }
}

fn require(bytes: &[u8], needed: usize) -> Result<(), DdsError> {
    if bytes.len() < needed {
        Err(DdsError::Truncated {
            needed,
            available: bytes.len(),
        })
    } else {
        Ok(())
    }
}

fn four_cc_format(four_cc: &[u8; 4]) -> Result<TextureFormat, DdsError> {
    Ok(match four_cc {
        b"DXT1" => TextureFormat::Bc1RgbaUnorm,
        b"DXT2" | b"DXT3" => TextureFormat::Bc2RgbaUnorm,
        b"DXT4" | b"DXT5" => TextureFormat::Bc3RgbaUnorm,
        b"ATI1" | b"BC4U" => TextureFormat::Bc4RUnorm,
        b"ATI2" | b"BC5U" => TextureFormat::Bc5RgUnorm,
        other => {
            return Err(DdsError::UnsupportedFormat(format!(
                "FourCC '{}'",
                String::from_utf8_lossy(other)
            )))
        }
    })
}

/// sRGB variants map to their unorm twin; no gamma conversion is applied.
fn dxgi_format(code: u32) -> Result<TextureFormat, DdsError> {
    Ok(match code {
        28 | 29 => TextureFormat::Rgba8Unorm,
        87 | 91 => TextureFormat::Bgra8Unorm,
        71 | 72 => TextureFormat::Bc1RgbaUnorm,
        74 | 75 => TextureFormat::Bc2RgbaUnorm,
        77 | 78 => TextureFormat::Bc3RgbaUnorm,
        80 => TextureFormat::Bc4RUnorm,
        83 => TextureFormat::Bc5RgUnorm,
        98 | 99 => TextureFormat::Bc7RgbaUnorm,
        other => return Err(DdsError::UnsupportedFormat(format!("DXGI format {other}"))),
    })
}

fn rgb_format(bit_count: u32, masks: [u32; 4], has_alpha: bool) -> Result<TextureFormat, DdsError> {
    let [r, g, b, a] = masks;
    let alpha_ok = !has_alpha || a == 0xff00_0000;
    match (bit_count, r, g, b) {
        (32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000) if alpha_ok => Ok(TextureFormat::Rgba8Unorm),
        (32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff) if alpha_ok => Ok(TextureFormat::Bgra8Unorm),
        _ => Err(DdsError::UnsupportedFormat(format!(
            "{bit_count}-bit RGB masks {r:#x}/{g:#x}/{b:#x}/{a:#x}"
        ))),
    }
}

/// Little-endian field reader over a header starting at `base`.
/// Callers check the length with [`require`] first.
struct Reader<'a> {
    bytes: &'a [u8],
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, base }
    }

    fn bytes(&self, at: usize) -> [u8; 4] {
        let i = self.base + at;
        [
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ]
    }

    fn u32(&self, at: usize) -> u32 {
        u32::from_le_bytes(self.bytes(at))
    }
}
