//! Deterministic 3D simplex-noise volume, baked on the CPU.
//!
//! The scene shader samples a tiling RGBA volume for accretion-disk detail:
//! R holds base-frequency noise, G and B hold 2x and 4x frequency bands, and
//! A holds an offset-seeded variant. The field is synthesized once at startup
//! from fixed permutation/gradient tables, so the same size always produces
//! the same volume, then uploaded as an `Rgba16Float` 3D texture with repeat
//! addressing on all axes.

use crate::gpu::pipeline_helpers::repeat_sampler_3d;

/// Canonical simplex-noise permutation table, duplicated to 512 entries so
/// nested lookups never need a wrap check.
static PERM: [u8; 512] = {
    let base: [u8; 256] = [
        151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225,
        140, 36, 103, 30, 69, 142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148,
        247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219, 203, 117, 35, 11, 32,
        57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68,
        175, 74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111,
        229, 122, 60, 211, 133, 230, 220, 105, 92, 41, 55, 46, 245, 40, 244,
        102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76, 132, 187, 208,
        89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109,
        198, 173, 186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147,
        118, 126, 255, 82, 85, 212, 207, 206, 59, 227, 47, 16, 58, 17, 182,
        189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163, 70,
        221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108,
        110, 79, 113, 224, 232, 178, 185, 112, 104, 218, 246, 97, 228, 251,
        34, 242, 193, 238, 210, 144, 12, 191, 179, 162, 241, 81, 51, 145,
        235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184,
        84, 204, 176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93,
        222, 114, 67, 29, 24, 72, 243, 141, 128, 195, 78, 66, 215, 61, 156,
        180,
    ];
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 512 {
        table[i] = base[i % 256];
        i += 1;
    }
    table
};

/// The 12 edge-midpoint gradient directions for 3D simplex noise.
const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

fn dot3(g: [f32; 3], x: f32, y: f32, z: f32) -> f32 {
    g[0] * x + g[1] * y + g[2] * z
}

fn fast_floor(x: f32) -> i32 {
    if x > 0.0 {
        x as i32
    } else {
        x as i32 - 1
    }
}

fn perm(index: usize) -> usize {
    usize::from(PERM[index])
}

/// Evaluate 3D simplex noise at a point. Output is approximately [-1, 1]
/// and is a pure function of the input (fixed tables, no state).
#[must_use]
pub fn simplex_3d(x: f32, y: f32, z: f32) -> f32 {
    // Skew/unskew factors for 3D
    const F3: f32 = 1.0 / 3.0;
    const G3: f32 = 1.0 / 6.0;

    let s = (x + y + z) * F3;
    let i = fast_floor(x + s);
    let j = fast_floor(y + s);
    let k = fast_floor(z + s);

    let t = (i + j + k) as f32 * G3;
    let x0 = x - (i as f32 - t);
    let y0 = y - (j as f32 - t);
    let z0 = z - (k as f32 - t);

    // Rank the fractional offsets to pick the simplex corner traversal
    // order; six orderings, one per tetrahedron of the cell decomposition.
    let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
        if y0 >= z0 {
            (1, 0, 0, 1, 1, 0)
        } else if x0 >= z0 {
            (1, 0, 0, 1, 0, 1)
        } else {
            (0, 0, 1, 1, 0, 1)
        }
    } else if y0 < z0 {
        (0, 0, 1, 0, 1, 1)
    } else if x0 < z0 {
        (0, 1, 0, 0, 1, 1)
    } else {
        (0, 1, 0, 1, 1, 0)
    };

    let x1 = x0 - i1 as f32 + G3;
    let y1 = y0 - j1 as f32 + G3;
    let z1 = z0 - k1 as f32 + G3;
    let x2 = x0 - i2 as f32 + 2.0 * G3;
    let y2 = y0 - j2 as f32 + 2.0 * G3;
    let z2 = z0 - k2 as f32 + 2.0 * G3;
    let x3 = x0 - 1.0 + 3.0 * G3;
    let y3 = y0 - 1.0 + 3.0 * G3;
    let z3 = z0 - 1.0 + 3.0 * G3;

    let ii = (i & 255) as usize;
    let jj = (j & 255) as usize;
    let kk = (k & 255) as usize;

    let gi0 = perm(ii + perm(jj + perm(kk))) % 12;
    let gi1 = perm(ii + i1 + perm(jj + j1 + perm(kk + k1))) % 12;
    let gi2 = perm(ii + i2 + perm(jj + j2 + perm(kk + k2))) % 12;
    let gi3 = perm(ii + 1 + perm(jj + 1 + perm(kk + 1))) % 12;

    let mut n = 0.0;

    let t0 = 0.6 - x0 * x0 - y0 * y0 - z0 * z0;
    if t0 >= 0.0 {
        let t0 = t0 * t0;
        n += t0 * t0 * dot3(GRAD3[gi0], x0, y0, z0);
    }
    let t1 = 0.6 - x1 * x1 - y1 * y1 - z1 * z1;
    if t1 >= 0.0 {
        let t1 = t1 * t1;
        n += t1 * t1 * dot3(GRAD3[gi1], x1, y1, z1);
    }
    let t2 = 0.6 - x2 * x2 - y2 * y2 - z2 * z2;
    if t2 >= 0.0 {
        let t2 = t2 * t2;
        n += t2 * t2 * dot3(GRAD3[gi2], x2, y2, z2);
    }
    let t3 = 0.6 - x3 * x3 - y3 * y3 - z3 * z3;
    if t3 >= 0.0 {
        let t3 = t3 * t3;
        n += t3 * t3 * dot3(GRAD3[gi3], x3, y3, z3);
    }

    // Scale the summed corner contributions to roughly [-1, 1]
    32.0 * n
}

/// Tiling factor: the noise field repeats 4 times across the volume, so
/// repeat-addressed sampling is seamless across its own domain.
const TILE_SCALE: f32 = 4.0;

/// Synthesize the raw RGBA field for a cubic volume of side `size`.
///
/// Pure function of `size`: identical inputs always yield bit-identical
/// output. Channels are remapped from [-1, 1] to [0, 1] and clamped (the
/// raw noise can overshoot by a hair). Layout is z-major, four `f32` per
/// voxel.
#[must_use]
pub fn generate_field(size: u32) -> Vec<f32> {
    let n = size as usize;
    let mut data = vec![0.0f32; n * n * n * 4];
    let inv = 1.0 / size as f32;

    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let px = x as f32 * inv * TILE_SCALE;
                let py = y as f32 * inv * TILE_SCALE;
                let pz = z as f32 * inv * TILE_SCALE;

                // R base frequency, G 2x, B 4x, A offset-seeded variant
                let remap = |v: f32| (v * 0.5 + 0.5).clamp(0.0, 1.0);
                let r = remap(simplex_3d(px, py, pz));
                let g = remap(simplex_3d(px * 2.0, py * 2.0, pz * 2.0));
                let b = remap(simplex_3d(px * 4.0, py * 4.0, pz * 4.0));
                let a =
                    remap(simplex_3d(px + 100.0, py + 200.0, pz + 300.0));

                let idx = (z * n * n + y * n + x) * 4;
                data[idx] = r;
                data[idx + 1] = g;
                data[idx + 2] = b;
                data[idx + 3] = a;
            }
        }
    }
    data
}

/// A baked, immutable 3D noise texture ready for sampling.
pub struct NoiseVolume {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: u32,
}

impl NoiseVolume {
    /// Synthesize and upload a `size`^3 RGBA volume. `size` should be a
    /// power of two (64, 128) so the tiling stays seamless.
    ///
    /// One-shot bake: there is no regeneration path and no error path short
    /// of device loss, which wgpu reports through its own error scopes.
    #[must_use]
    pub fn bake(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u32,
    ) -> Self {
        log::info!("generating {size}^3 RGBA noise volume");
        let field = generate_field(size);

        // Encode to f16 texels for an Rgba16Float upload
        let mut texels = vec![0u8; field.len() * 2];
        for (i, v) in field.iter().enumerate() {
            texels[i * 2..i * 2 + 2]
                .copy_from_slice(&half::f16::from_f32(*v).to_le_bytes());
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Noise Volume"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: size,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * 8),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: size,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Noise Volume View"),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });
        let sampler = repeat_sampler_3d(device, "Noise Volume Sampler");

        log::info!(
            "noise volume ready ({} KB)",
            u64::from(size) * u64::from(size) * u64::from(size) * 8 / 1024
        );

        Self {
            texture,
            view,
            sampler,
            size,
        }
    }

    /// View over the full volume for binding.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Repeat-addressing linear sampler.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Side length of the cubic volume.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The underlying texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_field, simplex_3d};

    #[test]
    fn generation_is_deterministic() {
        let a = generate_field(16);
        let b = generate_field(16);
        assert_eq!(a, b);
    }

    #[test]
    fn field_has_four_channels_per_voxel() {
        let field = generate_field(8);
        assert_eq!(field.len(), 8 * 8 * 8 * 4);
    }

    #[test]
    fn channels_remap_into_unit_range() {
        for v in generate_field(16) {
            assert!((0.0..=1.0).contains(&v), "channel out of range: {v}");
        }
    }

    #[test]
    fn noise_vanishes_at_the_origin() {
        // The origin skews onto itself: the first corner contributes
        // dot(g, 0) = 0 and the other three fall outside the 0.6 falloff.
        assert_eq!(simplex_3d(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn noise_is_near_zero_on_aligned_lattice_points() {
        // When x+y+z is divisible by 3 the skew lands (up to f32 rounding)
        // back on a lattice point, so the value collapses to ~0.
        for (x, y, z) in
            [(1.0, 1.0, 1.0), (1.0, 2.0, 3.0), (2.0, 2.0, 2.0)]
        {
            assert!(simplex_3d(x, y, z).abs() < 1e-4);
        }
    }

    #[test]
    fn noise_stays_in_signed_unit_range() {
        for i in 0..40 {
            for j in 0..40 {
                let v = simplex_3d(
                    i as f32 * 0.173,
                    j as f32 * 0.291,
                    (i + j) as f32 * 0.087,
                );
                assert!(v.abs() <= 1.05, "noise out of range: {v}");
            }
        }
    }

    #[test]
    fn noise_varies_off_lattice() {
        // Not identically zero between lattice points
        let v = simplex_3d(0.4, 0.7, 0.2);
        assert!(v.abs() > 1e-4);
    }
}
