use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{
        canvas::{Canvas, Map as WorldMap, MapResolution, Points},
        Block, BorderType, Widget,
    },
};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::surface::{MapSurface, MarkerLabel, ViewOptions};
use crate::workout::{Coordinate, WorkoutKind};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;
/// Cursor steps needed to cross the visible map
const CURSOR_STEPS: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub coordinate: Coordinate,
    pub label: MarkerLabel,
}

#[derive(Debug, Clone, Copy)]
struct Pan {
    from: Coordinate,
    to: Coordinate,
    elapsed: f64,
    duration: f64,
}

/// World map drawn on a braille canvas, with workout markers and a crosshair
#[derive(Debug)]
pub struct TerminalMap {
    center: Coordinate,
    zoom: u8,
    cursor: Coordinate,
    markers: BTreeMap<MarkerId, MapMarker>,
    next_marker: u64,
    pan: Option<Pan>,
}

impl Default for TerminalMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalMap {
    pub fn new() -> Self {
        let origin = Coordinate::new(0.0, 0.0);
        Self {
            center: origin,
            zoom: MIN_ZOOM,
            cursor: origin,
            markers: BTreeMap::new(),
            next_marker: 0,
            pan: None,
        }
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn cursor(&self) -> Coordinate {
        self.cursor
    }

    pub fn markers(&self) -> impl Iterator<Item = &MapMarker> {
        self.markers.values()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MapMarker> {
        self.markers.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Visible longitude span in degrees
    pub fn lng_span(&self) -> f64 {
        (1440.0 / 2f64.powi(self.zoom as i32)).min(360.0)
    }

    /// Visible latitude span in degrees; terminal cells are about twice as tall as wide
    pub fn lat_span(&self) -> f64 {
        (self.lng_span() / 2.0).min(180.0)
    }

    /// (west, east, south, north)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let (half_lng, half_lat) = (self.lng_span() / 2.0, self.lat_span() / 2.0);
        (
            self.center.lng - half_lng,
            self.center.lng + half_lng,
            self.center.lat - half_lat,
            self.center.lat + half_lat,
        )
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1).max(MIN_ZOOM);
    }

    /// Move the crosshair by whole steps; the view follows once it leaves
    pub fn move_cursor(&mut self, d_lng: i32, d_lat: i32) {
        let step_lng = self.lng_span() / CURSOR_STEPS;
        let step_lat = self.lat_span() / CURSOR_STEPS;
        self.cursor = clamp(Coordinate::new(
            self.cursor.lat + d_lat as f64 * step_lat,
            self.cursor.lng + d_lng as f64 * step_lng,
        ));

        let (west, east, south, north) = self.bounds();
        if self.cursor.lng < west
            || self.cursor.lng > east
            || self.cursor.lat < south
            || self.cursor.lat > north
        {
            self.pan = None;
            self.center = self.cursor;
        }
    }

    pub fn set_cursor(&mut self, at: Coordinate) {
        self.cursor = clamp(at);
    }

    /// Coordinate under a terminal cell of the map's inner area
    pub fn coordinate_at(&self, area: Rect, column: u16, row: u16) -> Option<Coordinate> {
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let (west, _, _, north) = self.bounds();
        let fx = (column - area.x) as f64 + 0.5;
        let fy = (row - area.y) as f64 + 0.5;
        Some(clamp(Coordinate::new(
            north - fy / area.height as f64 * self.lat_span(),
            west + fx / area.width as f64 * self.lng_span(),
        )))
    }

    /// Advance an animated pan
    pub fn advance(&mut self, dt: Duration) {
        let Some(mut pan) = self.pan else {
            return;
        };
        pan.elapsed += dt.as_secs_f64();
        let t = if pan.duration > 0.0 {
            (pan.elapsed / pan.duration).min(1.0)
        } else {
            1.0
        };
        self.center = Coordinate::new(
            pan.from.lat + (pan.to.lat - pan.from.lat) * t,
            pan.from.lng + (pan.to.lng - pan.from.lng) * t,
        );
        self.pan = if t >= 1.0 { None } else { Some(pan) };
    }
}

fn clamp(c: Coordinate) -> Coordinate {
    Coordinate::new(c.lat.clamp(-90.0, 90.0), c.lng.clamp(-180.0, 180.0))
}

pub fn kind_color(kind: WorkoutKind) -> Color {
    match kind {
        WorkoutKind::Running => Color::Rgb(0, 196, 106),
        WorkoutKind::Cycling => Color::Rgb(255, 181, 69),
    }
}

impl MapSurface for TerminalMap {
    type Handle = MarkerId;

    fn set_view(&mut self, center: Coordinate, zoom: u8, options: ViewOptions) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.cursor = clamp(center);
        if options.animate && options.pan_duration_secs > 0.0 {
            self.pan = Some(Pan {
                from: self.center,
                to: self.cursor,
                elapsed: 0.0,
                duration: options.pan_duration_secs,
            });
        } else {
            self.pan = None;
            self.center = self.cursor;
        }
    }

    fn add_marker(&mut self, coordinate: Coordinate, label: MarkerLabel) -> MarkerId {
        self.next_marker += 1;
        let id = MarkerId(self.next_marker);
        self.markers.insert(id, MapMarker { coordinate, label });
        id
    }

    fn remove_marker(&mut self, handle: MarkerId) {
        if self.markers.remove(&handle).is_none() {
            log::warn!("removing unknown map marker {:?}", handle);
        }
    }
}

/// Canvas rendering of a [`TerminalMap`]
pub struct MapView<'a> {
    pub map: &'a TerminalMap,
    pub focused: bool,
}

impl Widget for MapView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let map = self.map;
        let (west, east, south, north) = map.bounds();
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = format!(" map · zoom {} · {} ", map.zoom(), map.cursor());

        Canvas::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(border_style)
                    .title(title),
            )
            .marker(symbols::Marker::Braille)
            .x_bounds([west, east])
            .y_bounds([south, north])
            .paint(|ctx| {
                ctx.draw(&WorldMap {
                    resolution: MapResolution::High,
                    color: Color::DarkGray,
                });
                ctx.layer();

                for marker in map.markers() {
                    let color = kind_color(marker.label.kind);
                    let at = (marker.coordinate.lng, marker.coordinate.lat);
                    ctx.draw(&Points {
                        coords: &[at],
                        color,
                    });
                    ctx.print(
                        at.0,
                        at.1,
                        Span::styled(
                            format!("● {}", marker.label.text),
                            Style::default().fg(color),
                        ),
                    );
                }

                let cursor = map.cursor();
                ctx.print(
                    cursor.lng,
                    cursor.lat,
                    Span::styled(
                        "+",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            })
            .render(area, buf);
    }
}
