use log::warn;
use opencv::core::Point;
use opencv::core::Rect;
use opencv::core::Scalar;
use opencv::core::Size;
use opencv::imgproc::get_text_size;
use opencv::imgproc::line;
use opencv::imgproc::put_text;
use opencv::imgproc::rectangle;
use opencv::imgproc::rectangle_points;
use opencv::imgproc::FILLED;
use opencv::imgproc::LINE_8;
use opencv::prelude::Mat;
use opencv::prelude::MatTraitConst;

use super::bbox_text::parse_bbox;
use super::error::OverlayError;
use super::results_table::DetectionRecord;
use super::style::RenderStyle;
use super::{BestPlateEntry, BestPlates, BoundingBox};

/// Draws the four corner marks of a box instead of a full outline.
pub fn draw_border(
    image: &mut Mat,
    top_left: Point,
    bottom_right: Point,
    color: Scalar,
    thickness: i32,
    line_length_x: i32,
    line_length_y: i32,
) -> Result<(), OverlayError> {
    let (x1, y1) = (top_left.x, top_left.y);
    let (x2, y2) = (bottom_right.x, bottom_right.y);

    // boxes far outside the frame saturate instead of wrapping
    let segments = [
        // top-left
        ((x1, y1), (x1, y1.saturating_add(line_length_y))),
        ((x1, y1), (x1.saturating_add(line_length_x), y1)),
        // bottom-left
        ((x1, y2), (x1, y2.saturating_sub(line_length_y))),
        ((x1, y2), (x1.saturating_add(line_length_x), y2)),
        // top-right
        ((x2, y1), (x2.saturating_sub(line_length_x), y1)),
        ((x2, y1), (x2, y1.saturating_add(line_length_y))),
        // bottom-right
        ((x2, y2), (x2, y2.saturating_sub(line_length_y))),
        ((x2, y2), (x2.saturating_sub(line_length_x), y2)),
    ];

    for ((ax, ay), (bx, by)) in segments {
        line(
            image,
            Point::new(ax, ay),
            Point::new(bx, by),
            color,
            thickness,
            LINE_8,
            0,
        )?;
    }
    Ok(())
}

/// Where the crop and its text band go for a vehicle: the crop sits
/// `crop_offset` pixels above the vehicle box, centered on it, and the band
/// sits directly on top of the crop.
pub fn overlay_layout(car: &BoundingBox, crop_size: Size, style: &RenderStyle) -> (Rect, Rect) {
    let x = ((car.x1 + car.x2 - crop_size.width as f32) / 2.0) as i32;
    let crop_bottom = (car.y1 as i32).saturating_sub(style.crop_offset);
    let crop = Rect::new(
        x,
        crop_bottom.saturating_sub(crop_size.height),
        crop_size.width,
        crop_size.height,
    );
    let banner = Rect::new(
        x,
        crop.y.saturating_sub(style.banner_height),
        crop_size.width,
        style.banner_height,
    );
    (crop, banner)
}

/// Baseline origin that centers `text_size` on the vehicle and vertically
/// inside the band above a crop of `crop_size`.
pub fn text_origin(
    car: &BoundingBox,
    crop_size: Size,
    text_size: Size,
    style: &RenderStyle,
) -> Point {
    let band_center = car.y1
        - (crop_size.height + style.crop_offset) as f32
        - style.banner_height as f32 / 2.0;
    Point::new(
        ((car.x1 + car.x2 - text_size.width as f32) / 2.0) as i32,
        (band_center + text_size.height as f32 / 2.0) as i32,
    )
}

fn ensure_inside(region: Rect, frame: Size) -> Result<(), OverlayError> {
    let inside = region.x >= 0
        && region.y >= 0
        && region.width > 0
        && region.height > 0
        && region.x as i64 + region.width as i64 <= frame.width as i64
        && region.y as i64 + region.height as i64 <= frame.height as i64;
    if inside {
        Ok(())
    } else {
        Err(OverlayError::OutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            frame_width: frame.width,
            frame_height: frame.height,
        })
    }
}

#[derive(Debug)]
pub enum RowOutcome {
    /// Boxes drawn and the best plate shown above the vehicle.
    Annotated,
    /// Boxes drawn, the vehicle has no usable crop.
    AnnotatedWithoutPlate,
    /// Boxes drawn, the plate overlay could not be placed.
    OverlaySkipped(OverlayError),
    /// The row could not be drawn at all.
    RowSkipped(OverlayError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub annotated: usize,
    pub without_plate: usize,
    pub overlays_skipped: usize,
    pub rows_skipped: usize,
}

impl FrameReport {
    pub fn merge(&mut self, other: &FrameReport) {
        self.annotated += other.annotated;
        self.without_plate += other.without_plate;
        self.overlays_skipped += other.overlays_skipped;
        self.rows_skipped += other.rows_skipped;
    }

    fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Annotated => self.annotated += 1,
            RowOutcome::AnnotatedWithoutPlate => self.without_plate += 1,
            RowOutcome::OverlaySkipped(_) => self.overlays_skipped += 1,
            RowOutcome::RowSkipped(_) => self.rows_skipped += 1,
        }
    }

    pub fn rows(&self) -> usize {
        self.annotated + self.without_plate + self.overlays_skipped + self.rows_skipped
    }
}

pub struct BoundingBoxRender<'a> {
    style: &'a RenderStyle,
    plates: &'a BestPlates,
}

impl<'a> BoundingBoxRender<'a> {
    pub fn new(style: &'a RenderStyle, plates: &'a BestPlates) -> Self {
        Self { style, plates }
    }

    /// Annotates one frame in place. Rows that fail are logged and skipped.
    pub fn render<'r>(
        &self,
        image: &mut Mat,
        frame_nmr: u32,
        rows: impl IntoIterator<Item = &'r DetectionRecord>,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        for (row_index, record) in rows.into_iter().enumerate() {
            let outcome = self.render_row(image, frame_nmr, row_index, record);
            report.record(&outcome);
        }
        report
    }

    pub fn render_row(
        &self,
        image: &mut Mat,
        frame_nmr: u32,
        row_index: usize,
        record: &DetectionRecord,
    ) -> RowOutcome {
        let car = match self.draw_detection(image, record) {
            Ok(car) => car,
            Err(err) => {
                warn!(
                    "Error processing frame {}, row {} (car {}): {}",
                    frame_nmr, row_index, record.car_id, err
                );
                return RowOutcome::RowSkipped(err);
            }
        };

        let Some(entry) = self.plates.get(&record.car_id).filter(|e| e.has_crop()) else {
            return RowOutcome::AnnotatedWithoutPlate;
        };

        match self.draw_plate_overlay(image, &car, entry) {
            Ok(()) => RowOutcome::Annotated,
            Err(err) => {
                warn!(
                    "Error drawing overlay on frame {} for car {} at {:?}: {}",
                    frame_nmr, record.car_id, car, err
                );
                RowOutcome::OverlaySkipped(err)
            }
        }
    }

    fn draw_detection(
        &self,
        image: &mut Mat,
        record: &DetectionRecord,
    ) -> Result<BoundingBox, OverlayError> {
        let car = parse_bbox(&record.car_bbox)?;
        let ((x1, y1), (x2, y2)) = car.corners();
        draw_border(
            image,
            Point::new(x1, y1),
            Point::new(x2, y2),
            self.style.car_color,
            self.style.car_thickness,
            self.style.corner_length_x,
            self.style.corner_length_y,
        )?;

        let plate = parse_bbox(&record.license_plate_bbox)?;
        let ((x1, y1), (x2, y2)) = plate.corners();
        rectangle_points(
            image,
            Point::new(x1, y1),
            Point::new(x2, y2),
            self.style.plate_color,
            self.style.plate_thickness,
            LINE_8,
            0,
        )?;
        Ok(car)
    }

    /// Pastes the crop above the vehicle and writes the plate text on a band
    /// over it. Nothing is drawn unless both regions fit inside the frame.
    pub fn draw_plate_overlay(
        &self,
        image: &mut Mat,
        car: &BoundingBox,
        entry: &BestPlateEntry,
    ) -> Result<(), OverlayError> {
        let Some(crop) = entry.crop.as_ref() else {
            return Ok(());
        };
        let style = self.style;
        let frame_size = image.size()?;
        let (crop_region, banner) = overlay_layout(car, crop.size()?, style);
        ensure_inside(crop_region, frame_size)?;
        ensure_inside(banner, frame_size)?;

        let mut target = Mat::roi(image, crop_region)?;
        crop.copy_to(&mut target)?;

        rectangle(image, banner, style.banner_color, FILLED, LINE_8, 0)?;

        if entry.text.is_empty() {
            return Ok(());
        }
        let mut baseline = 0;
        let text_size = get_text_size(
            &entry.text,
            style.font_face,
            style.font_scale,
            style.text_thickness,
            &mut baseline,
        )?;
        put_text(
            image,
            &entry.text,
            text_origin(car, crop_region.size(), text_size, style),
            style.font_face,
            style.font_scale,
            style.text_color,
            style.text_thickness,
            LINE_8,
            false,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_overlay::test_frames::{blank_frame, pixel, solid_frame};
    use opencv::prelude::MatTraitConstManual;

    const GREEN: [u8; 3] = [0, 255, 0];
    const RED: [u8; 3] = [0, 0, 255];
    const WHITE: [u8; 3] = [255, 255, 255];
    const BLACK: [u8; 3] = [0, 0, 0];
    const BLUE: [u8; 3] = [255, 0, 0];

    fn small_style() -> RenderStyle {
        RenderStyle {
            car_thickness: 1,
            corner_length_x: 10,
            corner_length_y: 10,
            plate_thickness: 1,
            crop_height: 20,
            crop_offset: 10,
            banner_height: 30,
            font_scale: 0.5,
            text_thickness: 1,
            ..RenderStyle::default()
        }
    }

    fn record(car_id: i64, car_bbox: &str, plate_bbox: &str) -> DetectionRecord {
        DetectionRecord {
            frame_nmr: 0,
            car_id,
            car_bbox: car_bbox.to_string(),
            license_plate_bbox: plate_bbox.to_string(),
            license_plate_bbox_score: None,
            license_number: Some("AB12".to_string()),
            license_number_score: Some(0.5),
        }
    }

    fn blue_entry(width: i32, height: i32, text: &str) -> BestPlateEntry {
        BestPlateEntry {
            crop: Some(solid_frame(width, height, [255.0, 0.0, 0.0])),
            text: text.to_string(),
            score: Some(0.9),
            frame_nmr: 0,
        }
    }

    #[test]
    fn test_draw_border_only_marks_corners() {
        let mut frame = blank_frame(100, 100);
        draw_border(
            &mut frame,
            Point::new(10, 10),
            Point::new(90, 90),
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            1,
            20,
            20,
        )
        .unwrap();

        for (x, y) in [(10, 10), (25, 10), (10, 25), (90, 90), (75, 90), (90, 75), (10, 85), (85, 10)] {
            assert_eq!(pixel(&frame, x, y), GREEN, "corner arm at ({x}, {y})");
        }
        // middle of each side stays clear
        for (x, y) in [(50, 10), (10, 50), (50, 90), (90, 50), (50, 50)] {
            assert_eq!(pixel(&frame, x, y), BLACK, "gap at ({x}, {y})");
        }
    }

    #[test]
    fn test_overlay_layout() {
        let style = RenderStyle::default();
        let car = BoundingBox::new(1000.0, 1500.0, 1400.0, 1900.0);
        let (crop, banner) = overlay_layout(&car, Size::new(1000, 400), &style);
        assert_eq!(crop, Rect::new(700, 1000, 1000, 400));
        assert_eq!(banner, Rect::new(700, 700, 1000, 300));
    }

    #[test]
    fn test_text_origin_uses_unrounded_box() {
        let style = RenderStyle::default();
        let car = BoundingBox::new(1000.0, 1500.7, 1400.0, 1900.0);
        let origin = text_origin(&car, Size::new(1000, 400), Size::new(300, 45), &style);
        // 1500.7 - 400 - 250 + 22.5
        assert_eq!(origin, Point::new(1050, 873));
    }

    #[test]
    fn test_huge_coordinates_do_not_overflow() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(3, blue_entry(40, 20, "AB12"));
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let row = record(3, "[1e10 0 1e10 10]", "[0 0 1 1]");
        let outcome = render.render_row(&mut frame, 0, 0, &row);
        assert!(
            matches!(outcome, RowOutcome::OverlaySkipped(OverlayError::OutOfBounds { .. })),
            "{outcome:?}"
        );

        let low = record(3, "[-1e10 -1e10 -1e10 -1e10]", "[0 0 1 1]");
        assert!(matches!(
            render.render_row(&mut frame, 0, 1, &low),
            RowOutcome::OverlaySkipped(OverlayError::OutOfBounds { .. })
        ));

        draw_border(
            &mut frame,
            Point::new(i32::MAX, i32::MIN),
            Point::new(i32::MIN, i32::MAX),
            style.car_color,
            1,
            200,
            200,
        )
        .unwrap();
        assert!(ensure_inside(Rect::new(i32::MAX, 0, 10, 10), Size::new(200, 200)).is_err());
    }

    #[test]
    fn test_render_row_with_plate() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(3, blue_entry(40, 20, ""));
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let row = record(3, "[ 60.  100.   140.  180.]", "[80 150 120 170]");
        let outcome = render.render_row(&mut frame, 0, 0, &row);
        assert!(matches!(outcome, RowOutcome::Annotated), "{outcome:?}");

        // vehicle corner and plate outline
        assert_eq!(pixel(&frame, 60, 100), GREEN);
        assert_eq!(pixel(&frame, 100, 150), RED);
        // crop occupies rows [70, 90) and columns [80, 120)
        assert_eq!(pixel(&frame, 80, 70), BLUE);
        assert_eq!(pixel(&frame, 119, 89), BLUE);
        assert_eq!(pixel(&frame, 79, 80), BLACK);
        // band occupies rows [40, 70)
        assert_eq!(pixel(&frame, 80, 40), WHITE);
        assert_eq!(pixel(&frame, 119, 69), WHITE);
        assert_eq!(pixel(&frame, 100, 39), BLACK);
    }

    #[test]
    fn test_plate_text_drawn_inside_band() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(3, blue_entry(80, 20, "AB12"));
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let row = record(3, "[60 100 140 180]", "[80 150 120 170]");
        assert!(matches!(
            render.render_row(&mut frame, 0, 0, &row),
            RowOutcome::Annotated
        ));

        let mut dark = 0;
        for y in 40..70 {
            for x in 60..140 {
                if pixel(&frame, x, y) == BLACK {
                    dark += 1;
                }
            }
        }
        assert!(dark > 0, "expected text pixels inside the band");
        // top row of the band is above the glyphs
        assert_eq!(pixel(&frame, 100, 40), WHITE);
    }

    #[test]
    fn test_overlay_outside_frame_leaves_frame_untouched() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(3, blue_entry(40, 20, "AB12"));
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let car = BoundingBox::new(60.0, 30.0, 140.0, 120.0);
        let before = frame.data_bytes().unwrap().to_vec();
        let result = render.draw_plate_overlay(&mut frame, &car, &plates[&3]);
        assert!(matches!(result, Err(OverlayError::OutOfBounds { .. })));
        assert_eq!(frame.data_bytes().unwrap(), &before[..]);
    }

    #[test]
    fn test_overlay_failure_keeps_boxes() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(3, blue_entry(40, 20, "AB12"));
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let row = record(3, "[60 30 140 120]", "[80 90 120 110]");
        let outcome = render.render_row(&mut frame, 5, 0, &row);
        assert!(matches!(outcome, RowOutcome::OverlaySkipped(OverlayError::OutOfBounds { .. })));
        assert_eq!(pixel(&frame, 60, 30), GREEN);
        assert_eq!(pixel(&frame, 100, 90), RED);
    }

    #[test]
    fn test_render_skips_bad_rows_and_continues() {
        let style = small_style();
        let plates = BestPlates::new();
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let rows = vec![
            record(1, "not a box", "[0 0 1 1]"),
            record(2, "[60 100 140 180]", "[80 150 120]"),
            record(3, "[10 10 50 50]", "[20 30 40 40]"),
        ];
        let report = render.render(&mut frame, 0, &rows);
        assert_eq!(
            report,
            FrameReport {
                annotated: 0,
                without_plate: 1,
                overlays_skipped: 0,
                rows_skipped: 2,
            }
        );
        assert_eq!(report.rows(), 3);
        assert_eq!(pixel(&frame, 10, 10), GREEN);
    }

    #[test]
    fn test_vehicle_without_crop() {
        let style = small_style();
        let mut plates = BestPlates::new();
        plates.insert(
            3,
            BestPlateEntry {
                crop: None,
                text: "AB12".to_string(),
                score: Some(0.9),
                frame_nmr: 0,
            },
        );
        let render = BoundingBoxRender::new(&style, &plates);

        let mut frame = blank_frame(200, 200);
        let row = record(3, "[60 100 140 180]", "[80 150 120 170]");
        assert!(matches!(
            render.render_row(&mut frame, 0, 0, &row),
            RowOutcome::AnnotatedWithoutPlate
        ));
        assert_eq!(pixel(&frame, 100, 80), BLACK);
    }
}
