//! 관심 영역(ROI) 스케일링.
//!
//! fast_image_resize 기반 고속 다운스케일. `CaptureOptions::roi_scale`가
//! 1.0 미만일 때 오케스트레이터가 반환 직전에 적용한다.

use fast_image_resize::{images::Image as FirImage, ResizeAlg, ResizeOptions, Resizer};
use tracing::debug;

use tongyeok_core::error::CoreError;
use tongyeok_core::models::capture::CapturedFrame;

/// 프레임을 지정 배율로 다운스케일
///
/// `scale >= 1.0`이면 원본을 그대로 반환한다 (업스케일 없음).
pub fn scale_frame(frame: CapturedFrame, scale: f32) -> Result<CapturedFrame, CoreError> {
    if scale >= 1.0 {
        return Ok(frame);
    }
    if scale <= 0.0 {
        return Err(CoreError::Capture(format!("잘못된 ROI 배율: {scale}")));
    }

    let dst_w = ((frame.width as f32) * scale).round().max(1.0) as u32;
    let dst_h = ((frame.height as f32) * scale).round().max(1.0) as u32;

    if frame.width == 0 || frame.height == 0 {
        return Err(CoreError::Capture("소스 프레임 크기 0".to_string()));
    }

    let captured_at = frame.captured_at;
    let src_image = FirImage::from_vec_u8(
        frame.width,
        frame.height,
        frame.data,
        fast_image_resize::PixelType::U8x4,
    )
    .map_err(|e| CoreError::Capture(format!("소스 이미지 생성 실패: {e}")))?;

    let mut dst_image = FirImage::new(dst_w, dst_h, fast_image_resize::PixelType::U8x4);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| CoreError::Capture(format!("ROI 리사이즈 실패: {e}")))?;

    debug!(dst_w, dst_h, scale, "ROI 다운스케일 적용");

    Ok(CapturedFrame {
        width: dst_w,
        height: dst_h,
        data: dst_image.into_vec(),
        captured_at,
    })
}
