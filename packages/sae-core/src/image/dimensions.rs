/// リサイズ時の切り出し元・出力先の矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDimensions {
    pub dst_x: u32,
    pub dst_y: u32,
    pub src_x: u32,
    pub src_y: u32,
    pub dst_w: u32,
    pub dst_h: u32,
    pub src_w: u32,
    pub src_h: u32,
}

/// 指定された領域に収まるよう縮小した寸法を計算する（拡大しない）
///
/// 0 または None の上限は無制限として扱う
pub fn constrain_dimensions(
    cur_w: u32,
    cur_h: u32,
    max_w: Option<u32>,
    max_h: Option<u32>,
) -> (u32, u32) {
    let max_w = max_w.unwrap_or(0);
    let max_h = max_h.unwrap_or(0);
    if max_w == 0 && max_h == 0 {
        return (cur_w, cur_h);
    }

    let mut width_ratio = 1.0;
    let mut height_ratio = 1.0;
    let mut did_width = false;
    let mut did_height = false;

    if max_w > 0 && cur_w > max_w {
        width_ratio = max_w as f64 / cur_w as f64;
        did_width = true;
    }
    if max_h > 0 && cur_h > max_h {
        height_ratio = max_h as f64 / cur_h as f64;
        did_height = true;
    }

    let smaller = f64::min(width_ratio, height_ratio);
    let larger = f64::max(width_ratio, height_ratio);

    // 大きい方の倍率で上限を超える場合は小さい方を採用
    let ratio = if scaled(cur_w, larger) > max_w || scaled(cur_h, larger) > max_h {
        smaller
    } else {
        larger
    };

    let mut w = scaled(cur_w, ratio).max(1);
    let mut h = scaled(cur_h, ratio).max(1);

    // 丸め誤差で 1px 足りない場合は上限に合わせる
    if did_width && w + 1 == max_w {
        w = max_w;
    }
    if did_height && h + 1 == max_h {
        h = max_h;
    }

    (w, h)
}

/// リサイズ後の寸法と切り出し元の矩形を計算する
///
/// - `crop == false`: アスペクト比を維持して領域に収める
/// - `crop == true`: 領域を埋めるよう中央から切り出す
///
/// 計算できない場合（元画像が空、出力先が未指定、拡大になる）は None
pub fn resize_dimensions(
    orig_w: u32,
    orig_h: u32,
    dest_w: Option<u32>,
    dest_h: Option<u32>,
    crop: bool,
) -> Option<ResizeDimensions> {
    if orig_w == 0 || orig_h == 0 {
        return None;
    }
    let dw = dest_w.unwrap_or(0);
    let dh = dest_h.unwrap_or(0);
    if dw == 0 && dh == 0 {
        return None;
    }

    let (new_w, new_h, src_x, src_y, src_w, src_h) = if crop {
        let aspect_ratio = orig_w as f64 / orig_h as f64;

        let mut new_w = dw.min(orig_w);
        let mut new_h = dh.min(orig_h);
        if new_w == 0 {
            new_w = (new_h as f64 * aspect_ratio).round() as u32;
        }
        if new_h == 0 {
            new_h = (new_w as f64 / aspect_ratio).round() as u32;
        }

        let size_ratio = f64::max(
            new_w as f64 / orig_w as f64,
            new_h as f64 / orig_h as f64,
        );
        let crop_w = (new_w as f64 / size_ratio).round() as u32;
        let crop_h = (new_h as f64 / size_ratio).round() as u32;

        let s_x = orig_w.saturating_sub(crop_w) / 2;
        let s_y = orig_h.saturating_sub(crop_h) / 2;

        (new_w, new_h, s_x, s_y, crop_w, crop_h)
    } else {
        let (new_w, new_h) = constrain_dimensions(orig_w, orig_h, dest_w, dest_h);
        (new_w, new_h, 0, 0, orig_w, orig_h)
    };

    // 拡大・等倍にしかならない場合は何もしない
    if new_w >= orig_w && new_h >= orig_h && dw != orig_w && dh != orig_h {
        return None;
    }

    Some(ResizeDimensions {
        dst_x: 0,
        dst_y: 0,
        src_x,
        src_y,
        dst_w: new_w,
        dst_h: new_h,
        src_w,
        src_h,
    })
}

fn scaled(value: u32, ratio: f64) -> u32 {
    (value as f64 * ratio).round() as u32
}
