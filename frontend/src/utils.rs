use crate::models::ChartSlice;
use std::f64::consts::PI;

pub fn format_iso8601_date(iso_date: &str) -> String {
    if let Ok(datetime) = iso_date.parse::<chrono::DateTime<chrono::Utc>>() {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        iso_date.to_string()
    }
}

// Formats each x1000 step
pub fn format_number(number: u64) -> String {
    let num_str = number.to_string();
    let mut result = String::new();
    let len = num_str.len();

    for (i, c) in num_str.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

pub const PIE_CENTER: f64 = 100.0;
pub const PIE_RADIUS: f64 = 90.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PieShape {
    /// The slice covers the whole chart, which an SVG arc cannot draw.
    Circle,
    Path(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSegment {
    pub name: String,
    pub color: String,
    pub percent: f64,
    pub shape: PieShape,
}

fn point_at(angle: f64) -> (f64, f64) {
    (
        PIE_CENTER + PIE_RADIUS * angle.cos(),
        PIE_CENTER + PIE_RADIUS * angle.sin(),
    )
}

/// Lays the chart slices out clockwise from twelve o'clock. Empty slices are skipped.
pub fn pie_segments(chart: &[ChartSlice]) -> Vec<PieSegment> {
    let mut segments = Vec::new();
    let mut start = -PI / 2.0;

    for slice in chart.iter().filter(|slice| slice.percent > 0.0) {
        let fraction = (slice.percent / 100.0).min(1.0);
        let shape = if fraction >= 1.0 {
            PieShape::Circle
        } else {
            let end = start + fraction * 2.0 * PI;
            let (x1, y1) = point_at(start);
            let (x2, y2) = point_at(end);
            let large_arc = if fraction > 0.5 { 1 } else { 0 };
            start = end;
            PieShape::Path(format!(
                "M {c:.2} {c:.2} L {x1:.2} {y1:.2} A {r:.2} {r:.2} 0 {large_arc} 1 {x2:.2} {y2:.2} Z",
                c = PIE_CENTER,
                r = PIE_RADIUS
            ))
        };

        segments.push(PieSegment {
            name: slice.name.clone(),
            color: slice.color.clone(),
            percent: slice.percent,
            shape,
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;

    fn slice(label: SentimentLabel, percent: f64, color: &str) -> ChartSlice {
        ChartSlice {
            label,
            name: label.display_name().to_string(),
            percent,
            color: color.to_string(),
        }
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn formats_dates_and_falls_back_to_input() {
        assert_eq!(format_iso8601_date("2024-03-01T12:30:00Z"), "2024-03-01");
        assert_eq!(format_iso8601_date("yesterday"), "yesterday");
    }

    #[test]
    fn formats_percent_to_one_decimal() {
        assert_eq!(format_percent(66.7), "66.7%");
        assert_eq!(format_percent(0.0), "0.0%");
    }

    #[test]
    fn halves_split_at_top_and_bottom() {
        let chart = vec![
            slice(SentimentLabel::Positive, 50.0, "green"),
            slice(SentimentLabel::Negative, 50.0, "red"),
        ];
        let segments = pie_segments(&chart);

        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0].shape,
            PieShape::Path(
                "M 100.00 100.00 L 100.00 10.00 A 90.00 90.00 0 0 1 100.00 190.00 Z".to_string()
            )
        );
        assert_eq!(
            segments[1].shape,
            PieShape::Path(
                "M 100.00 100.00 L 100.00 190.00 A 90.00 90.00 0 0 1 100.00 10.00 Z".to_string()
            )
        );
    }

    #[test]
    fn large_slice_uses_large_arc_flag() {
        let chart = vec![
            slice(SentimentLabel::Positive, 66.7, "green"),
            slice(SentimentLabel::Negative, 33.3, "red"),
        ];
        let segments = pie_segments(&chart);

        match &segments[0].shape {
            PieShape::Path(path) => assert!(path.contains(" 0 1 1 ")),
            PieShape::Circle => panic!("expected an arc"),
        }
        match &segments[1].shape {
            PieShape::Path(path) => assert!(path.contains(" 0 0 1 ")),
            PieShape::Circle => panic!("expected an arc"),
        }
    }

    #[test]
    fn single_category_is_a_full_circle() {
        let chart = vec![
            slice(SentimentLabel::Positive, 100.0, "green"),
            slice(SentimentLabel::Neutral, 0.0, "gray"),
            slice(SentimentLabel::Negative, 0.0, "red"),
        ];
        let segments = pie_segments(&chart);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].shape, PieShape::Circle);
        assert_eq!(segments[0].color, "green");
    }

    #[test]
    fn empty_summary_draws_nothing() {
        let chart = vec![
            slice(SentimentLabel::Positive, 0.0, "green"),
            slice(SentimentLabel::Neutral, 0.0, "gray"),
            slice(SentimentLabel::Negative, 0.0, "red"),
        ];
        assert!(pie_segments(&chart).is_empty());
    }
}
