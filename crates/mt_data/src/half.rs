// crates/mt_data/src/half.rs

//! IEEE-754 binary16 编解码
//!
//! 扩散度档案以半精度存储 K 场。布局：符号位 b15，
//! 5 位指数 b10–b14（偏置 15），10 位尾数 b0–b9。
//!
//! - 指数 0：非规格化数，值 = 符号 × 2⁻¹⁴ × (尾数/1024)
//! - 指数 31：尾数 0 为 ±∞，否则 NaN
//! - 其余：值 = 符号 × 2^(指数−15) × (1 + 尾数/1024)
//!
//! 解码-再编码对任何规范存储值逐位还原（见 round-trip 测试）。

/// binary16 → f32
#[must_use]
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0f32 } else { 1.0 };
    let exp = ((bits >> 10) & 0x1f) as i32;
    let frac = (bits & 0x3ff) as f32;

    match exp {
        0 => {
            // 非规格化（含 ±0）
            sign * 6.103_515_625e-5 * (frac / 1024.0)
        }
        31 => {
            if frac == 0.0 {
                sign * f32::INFINITY
            } else {
                f32::NAN
            }
        }
        _ => sign * 2.0f32.powi(exp - 15) * (1.0 + frac / 1024.0),
    }
}

/// f32 → binary16，向最近偶数舍入
#[must_use]
pub fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp32 = ((bits >> 23) & 0xff) as i32;
    let mut frac = bits & 0x007f_ffff;

    if exp32 == 255 {
        // Inf / NaN
        return sign | 0x7c00 | if frac != 0 { 0x0200 } else { 0 };
    }

    let exp = exp32 - 127 + 15;
    if exp >= 31 {
        // 上溢 → ±∞
        return sign | 0x7c00;
    }
    if exp <= 0 {
        if exp < -10 {
            // 下溢 → ±0
            return sign;
        }
        // 非规格化：24 位尾数右移到 10 位
        frac |= 0x0080_0000;
        let shift = (14 - exp) as u32;
        let sub = frac >> shift;
        let round_bit = 1u32 << (shift - 1);
        let mut h = sub as u16;
        if frac & round_bit != 0 && (frac & (round_bit - 1) != 0 || sub & 1 != 0) {
            h += 1;
        }
        return sign | h;
    }

    // 规格化：进位可能溢入指数位，这正是正确的舍入行为
    let mut h = (((exp as u32) << 10) | (frac >> 13)) as u16;
    let round_bit = 1u32 << 12;
    if frac & round_bit != 0 && (frac & (round_bit - 1) != 0 || h & 1 != 0) {
        h = h.wrapping_add(1);
    }
    sign | h
}
