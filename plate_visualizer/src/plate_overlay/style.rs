use opencv::core::Scalar;
use opencv::imgproc::FONT_HERSHEY_SIMPLEX;

/// Colors (BGR), strokes and offsets used when annotating frames.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub car_color: Scalar,
    pub car_thickness: i32,
    pub corner_length_x: i32,
    pub corner_length_y: i32,

    pub plate_color: Scalar,
    pub plate_thickness: i32,

    /// Height every plate crop is resized to.
    pub crop_height: i32,
    /// Gap between the top of the vehicle box and the bottom of the crop.
    pub crop_offset: i32,
    /// Height of the text band painted above the crop.
    pub banner_height: i32,
    pub banner_color: Scalar,

    pub font_face: i32,
    pub font_scale: f64,
    pub text_thickness: i32,
    pub text_color: Scalar,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            car_color: Scalar::new(0.0, 255.0, 0.0, 0.0),
            car_thickness: 25,
            corner_length_x: 200,
            corner_length_y: 200,
            plate_color: Scalar::new(0.0, 0.0, 255.0, 0.0),
            plate_thickness: 12,
            crop_height: 400,
            crop_offset: 100,
            banner_height: 300,
            banner_color: Scalar::new(255.0, 255.0, 255.0, 0.0),
            font_face: FONT_HERSHEY_SIMPLEX,
            font_scale: 4.3,
            text_thickness: 17,
            text_color: Scalar::new(0.0, 0.0, 0.0, 0.0),
        }
    }
}
