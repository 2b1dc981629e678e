// crates/mt_data/src/binary.rs

//! 日文件二进制格式
//!
//! 两类档案共用"小端整数头 + 连续原始数组"的布局，数组以
//! 类型化切片视图暴露，整个文件只占一块对齐缓冲。
//!
//! # 流场日文件
//!
//! ```text
//! +--------------------------------------+
//! | version: i32   2 | 3 | 4             |
//! | n_lat: i32                           |
//! | n_lon: i32                           |
//! | n_depth: i32   仅 version 4          |
//! | year: i32                            |
//! | month: i32                           |
//! | day: i32       仅 version 3 / 4      |
//! +--------------------------------------+
//! | lon: f32 [n_lat·n_lon]               |
//! | lat: f32 [n_lat·n_lon]               |
//! | u:   f32 [n_depth·n_lat·n_lon]  m/s  |
//! | v:   f32 [n_depth·n_lat·n_lon]  m/s  |
//! +--------------------------------------+
//! ```
//!
//! version 2 为月均存档的遗留头（无 day 字段，day 记为 1），
//! version 3 为二维逐日，version 4 为三维逐日。陆地填充值为
//! NaN 或绝对值超过 1000 的哨兵（遗留档案用 −9999）。
//!
//! # 扩散度日文件
//!
//! ```text
//! | version: i32 (= 6) | year | month | day | max_error_scaled |
//! | K: u16 [n_lat·n_lon]   IEEE binary16, m²/s                 |
//! ```
//!
//! 网格坐标跨日共享，单独存放在 `eke_coords.bin`：
//! `{version, n_lat, n_lon}` 头加 lon/lat 两个 f32 数组。
//! `max_error = max_error_scaled / 1000`，仅作诊断。

use crate::error::{DataError, DataResult};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// 流场文件支持的版本
pub const CURRENT_VERSIONS: &str = "2/3/4";
/// 扩散度文件版本
pub const DIFFUSIVITY_VERSION: i32 = 6;
/// 坐标文件版本
pub const COORDS_VERSION: i32 = 1;

// ============================================================
// 对齐缓冲
// ============================================================

/// 4 字节对齐的文件缓冲
///
/// 以 u32 为底层存储保证 f32 视图的对齐；读入后不再复制。
struct OwnedBuffer {
    words: Vec<u32>,
    len: usize,
}

impl OwnedBuffer {
    fn read_from(path: &Path) -> DataResult<Self> {
        let mut file =
            File::open(path).map_err(|e| DataError::unavailable(path, e.to_string()))?;
        let len = file
            .metadata()
            .map_err(|e| DataError::unavailable(path, e.to_string()))?
            .len() as usize;
        let mut words = vec![0u32; len.div_ceil(4)];
        {
            let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
            file.read_exact(&mut bytes[..len])
                .map_err(|e| DataError::corrupt(path, format!("读取失败: {}", e)))?;
        }
        Ok(Self { words, len })
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    fn len(&self) -> usize {
        self.len
    }

    /// 指定字节区间的 f32 视图（偏移必须 4 字节对齐）
    fn f32_slice(&self, offset: usize, count: usize) -> &[f32] {
        bytemuck::cast_slice(&self.bytes()[offset..offset + count * 4])
    }

    /// 指定字节区间的 u16 视图
    fn u16_slice(&self, offset: usize, count: usize) -> &[u16] {
        bytemuck::cast_slice(&self.bytes()[offset..offset + count * 2])
    }
}

/// 头部小端整数游标
struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> HeaderCursor<'a> {
    fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self { bytes, pos: 0, path }
    }

    fn read_i32(&mut self) -> DataResult<i32> {
        let end = self.pos + 4;
        if end > self.bytes.len() {
            return Err(DataError::corrupt(self.path, "头部截断"));
        }
        let v = i32::from_le_bytes(self.bytes[self.pos..end].try_into().unwrap());
        self.pos = end;
        Ok(v)
    }

    fn offset(&self) -> usize {
        self.pos
    }
}

fn positive_dim(path: &Path, name: &str, v: i32) -> DataResult<usize> {
    if v <= 0 {
        return Err(DataError::corrupt(path, format!("{} 非正: {}", name, v)));
    }
    Ok(v as usize)
}

// ============================================================
// 流场日文件
// ============================================================

/// 流场文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentHeader {
    /// 格式版本（2 / 3 / 4）
    pub version: i32,
    /// 纬向网格数
    pub n_lat: usize,
    /// 经向网格数
    pub n_lon: usize,
    /// 深度层数（version < 4 时为 1）
    pub n_depth: usize,
    /// 年
    pub year: i32,
    /// 月
    pub month: u32,
    /// 日（version 2 无此字段，记为 1）
    pub day: u32,
}

impl CurrentHeader {
    /// 单层网格单元数
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.n_lat * self.n_lon
    }

    /// 文件对应的日历日期
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// 已解析的流场日文件
///
/// 坐标数组与数据数组共享同一缓冲，生命周期一同结束。
pub struct CurrentDayFile {
    header: CurrentHeader,
    buf: OwnedBuffer,
    lon_off: usize,
    lat_off: usize,
    u_off: usize,
    v_off: usize,
}

impl CurrentDayFile {
    /// 打开并校验一个流场日文件
    pub fn open(path: &Path) -> DataResult<Self> {
        let buf = OwnedBuffer::read_from(path)?;
        let mut cur = HeaderCursor::new(buf.bytes(), path);

        let version = cur.read_i32()?;
        let (n_lat, n_lon, n_depth, year, month, day) = match version {
            2 => {
                let n_lat = positive_dim(path, "n_lat", cur.read_i32()?)?;
                let n_lon = positive_dim(path, "n_lon", cur.read_i32()?)?;
                let year = cur.read_i32()?;
                let month = cur.read_i32()?;
                (n_lat, n_lon, 1, year, month, 1)
            }
            3 => {
                let n_lat = positive_dim(path, "n_lat", cur.read_i32()?)?;
                let n_lon = positive_dim(path, "n_lon", cur.read_i32()?)?;
                let year = cur.read_i32()?;
                let month = cur.read_i32()?;
                let day = cur.read_i32()?;
                (n_lat, n_lon, 1, year, month, day)
            }
            4 => {
                let n_lat = positive_dim(path, "n_lat", cur.read_i32()?)?;
                let n_lon = positive_dim(path, "n_lon", cur.read_i32()?)?;
                let n_depth = positive_dim(path, "n_depth", cur.read_i32()?)?;
                let year = cur.read_i32()?;
                let month = cur.read_i32()?;
                let day = cur.read_i32()?;
                (n_lat, n_lon, n_depth, year, month, day)
            }
            other => return Err(DataError::unsupported(path, other, CURRENT_VERSIONS)),
        };

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(DataError::corrupt(
                path,
                format!("日期字段无效: {}-{}-{}", year, month, day),
            ));
        }

        let header = CurrentHeader {
            version,
            n_lat,
            n_lon,
            n_depth,
            year,
            month: month as u32,
            day: day as u32,
        };

        let n_cells = header
            .n_lat
            .checked_mul(header.n_lon)
            .ok_or_else(|| DataError::corrupt(path, "网格尺寸溢出"))?;
        let n_volume = n_cells
            .checked_mul(header.n_depth)
            .ok_or_else(|| DataError::corrupt(path, "网格尺寸溢出"))?;

        let lon_off = cur.offset();
        let lat_off = lon_off + n_cells * 4;
        let u_off = lat_off + n_cells * 4;
        let v_off = u_off + n_volume * 4;
        let expected = v_off + n_volume * 4;

        if buf.len() != expected {
            return Err(DataError::corrupt(
                path,
                format!("尺寸不符: 期望 {} 字节, 实际 {}", expected, buf.len()),
            ));
        }

        Ok(Self {
            header,
            buf,
            lon_off,
            lat_off,
            u_off,
            v_off,
        })
    }

    /// 文件头
    #[must_use]
    pub fn header(&self) -> &CurrentHeader {
        &self.header
    }

    /// 经度数组（按纬向行主序）
    #[must_use]
    pub fn lon(&self) -> &[f32] {
        self.buf.f32_slice(self.lon_off, self.header.n_cells())
    }

    /// 纬度数组
    #[must_use]
    pub fn lat(&self) -> &[f32] {
        self.buf.f32_slice(self.lat_off, self.header.n_cells())
    }

    /// 第 k 层的东向流速 [m/s]
    #[must_use]
    pub fn u_layer(&self, k: usize) -> &[f32] {
        let n = self.header.n_cells();
        self.buf.f32_slice(self.u_off + k * n * 4, n)
    }

    /// 第 k 层的北向流速 [m/s]
    #[must_use]
    pub fn v_layer(&self, k: usize) -> &[f32] {
        let n = self.header.n_cells();
        self.buf.f32_slice(self.v_off + k * n * 4, n)
    }
}

// ============================================================
// 扩散度日文件
// ============================================================

/// 扩散度文件头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusivityHeader {
    pub version: i32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 最大量化误差 × 1000（诊断用）
    pub max_error_scaled: i32,
}

impl DiffusivityHeader {
    /// 最大量化误差 [m²/s]
    #[must_use]
    pub fn max_error(&self) -> f64 {
        self.max_error_scaled as f64 / 1000.0
    }

    /// 文件对应的日历日期
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// 已解析的扩散度日文件
pub struct DiffusivityDayFile {
    header: DiffusivityHeader,
    buf: OwnedBuffer,
    k_off: usize,
    n_values: usize,
}

impl DiffusivityDayFile {
    /// 打开并校验一个扩散度日文件
    ///
    /// 网格尺寸来自共享坐标文件，调用方以 `expected_cells` 传入。
    pub fn open(path: &Path, expected_cells: usize) -> DataResult<Self> {
        let buf = OwnedBuffer::read_from(path)?;
        let mut cur = HeaderCursor::new(buf.bytes(), path);

        let version = cur.read_i32()?;
        if version != DIFFUSIVITY_VERSION {
            return Err(DataError::unsupported(path, version, "6"));
        }
        let year = cur.read_i32()?;
        let month = cur.read_i32()?;
        let day = cur.read_i32()?;
        let max_error_scaled = cur.read_i32()?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(DataError::corrupt(
                path,
                format!("日期字段无效: {}-{}-{}", year, month, day),
            ));
        }

        let k_off = cur.offset();
        let expected = k_off + expected_cells * 2;
        if buf.len() != expected {
            return Err(DataError::corrupt(
                path,
                format!("尺寸不符: 期望 {} 字节, 实际 {}", expected, buf.len()),
            ));
        }

        Ok(Self {
            header: DiffusivityHeader {
                version,
                year,
                month: month as u32,
                day: day as u32,
                max_error_scaled,
            },
            buf,
            k_off,
            n_values: expected_cells,
        })
    }

    /// 文件头
    #[must_use]
    pub fn header(&self) -> &DiffusivityHeader {
        &self.header
    }

    /// 半精度 K 数组（原始编码）
    #[must_use]
    pub fn k_half(&self) -> &[u16] {
        self.buf.u16_slice(self.k_off, self.n_values)
    }
}

// ============================================================
// 共享坐标文件
// ============================================================

/// 扩散度档案的共享坐标文件
pub struct EkeCoordsFile {
    pub n_lat: usize,
    pub n_lon: usize,
    buf: OwnedBuffer,
    lon_off: usize,
    lat_off: usize,
}

impl EkeCoordsFile {
    /// 打开坐标文件
    pub fn open(path: &Path) -> DataResult<Self> {
        let buf = OwnedBuffer::read_from(path)?;
        let mut cur = HeaderCursor::new(buf.bytes(), path);

        let version = cur.read_i32()?;
        if version != COORDS_VERSION {
            return Err(DataError::unsupported(path, version, "1"));
        }
        let n_lat = positive_dim(path, "n_lat", cur.read_i32()?)?;
        let n_lon = positive_dim(path, "n_lon", cur.read_i32()?)?;
        let n_cells = n_lat
            .checked_mul(n_lon)
            .ok_or_else(|| DataError::corrupt(path, "网格尺寸溢出"))?;

        let lon_off = cur.offset();
        let lat_off = lon_off + n_cells * 4;
        let expected = lat_off + n_cells * 4;
        if buf.len() != expected {
            return Err(DataError::corrupt(
                path,
                format!("尺寸不符: 期望 {} 字节, 实际 {}", expected, buf.len()),
            ));
        }

        Ok(Self {
            n_lat,
            n_lon,
            buf,
            lon_off,
            lat_off,
        })
    }

    /// 单元数
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.n_lat * self.n_lon
    }

    /// 经度数组
    #[must_use]
    pub fn lon(&self) -> &[f32] {
        self.buf.f32_slice(self.lon_off, self.n_cells())
    }

    /// 纬度数组
    #[must_use]
    pub fn lat(&self) -> &[f32] {
        self.buf.f32_slice(self.lat_off, self.n_cells())
    }
}

// ============================================================
// 写入（数据准备与测试）
// ============================================================

fn write_i32<W: Write>(w: &mut W, v: i32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f32_array<W: Write>(w: &mut W, data: &[f32]) -> std::io::Result<()> {
    for &v in data {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

/// 写入一个流场日文件
///
/// 按 `header.version` 决定头部布局；数组长度必须与头部一致。
pub fn write_current_day(
    path: &Path,
    header: &CurrentHeader,
    lon: &[f32],
    lat: &[f32],
    u: &[f32],
    v: &[f32],
) -> DataResult<()> {
    let n_cells = header.n_cells();
    let n_volume = n_cells * header.n_depth;
    if lon.len() != n_cells || lat.len() != n_cells || u.len() != n_volume || v.len() != n_volume {
        return Err(DataError::corrupt(path, "数组长度与头部不一致"));
    }

    let io_err = |e: std::io::Error| DataError::unavailable(path, e.to_string());
    let mut file = File::create(path).map_err(io_err)?;

    write_i32(&mut file, header.version).map_err(io_err)?;
    write_i32(&mut file, header.n_lat as i32).map_err(io_err)?;
    write_i32(&mut file, header.n_lon as i32).map_err(io_err)?;
    if header.version == 4 {
        write_i32(&mut file, header.n_depth as i32).map_err(io_err)?;
    }
    write_i32(&mut file, header.year).map_err(io_err)?;
    write_i32(&mut file, header.month as i32).map_err(io_err)?;
    if header.version >= 3 {
        write_i32(&mut file, header.day as i32).map_err(io_err)?;
    }

    write_f32_array(&mut file, lon).map_err(io_err)?;
    write_f32_array(&mut file, lat).map_err(io_err)?;
    write_f32_array(&mut file, u).map_err(io_err)?;
    write_f32_array(&mut file, v).map_err(io_err)?;
    Ok(())
}

/// 写入一个扩散度日文件
pub fn write_diffusivity_day(
    path: &Path,
    header: &DiffusivityHeader,
    k_half: &[u16],
) -> DataResult<()> {
    let io_err = |e: std::io::Error| DataError::unavailable(path, e.to_string());
    let mut file = File::create(path).map_err(io_err)?;

    write_i32(&mut file, header.version).map_err(io_err)?;
    write_i32(&mut file, header.year).map_err(io_err)?;
    write_i32(&mut file, header.month as i32).map_err(io_err)?;
    write_i32(&mut file, header.day as i32).map_err(io_err)?;
    write_i32(&mut file, header.max_error_scaled).map_err(io_err)?;
    for &v in k_half {
        file.write_all(&v.to_le_bytes()).map_err(io_err)?;
    }
    Ok(())
}

/// 写入共享坐标文件
pub fn write_eke_coords(path: &Path, n_lat: usize, n_lon: usize, lon: &[f32], lat: &[f32]) -> DataResult<()> {
    if lon.len() != n_lat * n_lon || lat.len() != n_lat * n_lon {
        return Err(DataError::corrupt(path, "数组长度与头部不一致"));
    }
    let io_err = |e: std::io::Error| DataError::unavailable(path, e.to_string());
    let mut file = File::create(path).map_err(io_err)?;
    write_i32(&mut file, COORDS_VERSION).map_err(io_err)?;
    write_i32(&mut file, n_lat as i32).map_err(io_err)?;
    write_i32(&mut file, n_lon as i32).map_err(io_err)?;
    write_f32_array(&mut file, lon).map_err(io_err)?;
    write_f32_array(&mut file, lat).map_err(io_err)?;
    Ok(())
}
