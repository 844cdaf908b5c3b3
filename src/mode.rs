//! Layout/visibility state for the two chat surfaces.
//!
//! Control affordances (titles, pressed state, float button visibility) are
//! computed from the mode rather than stored beside it, so a transition can
//! never leave them stale.

/// Which front-end a piece of state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Page,
    Widget,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Page => "page",
            Surface::Widget => "widget",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    #[default]
    Normal,
    Fullscreen,
}

impl PageMode {
    /// Toggle-button click
    pub fn toggle(&mut self) {
        *self = match self {
            PageMode::Normal => PageMode::Fullscreen,
            PageMode::Fullscreen => PageMode::Normal,
        };
    }

    /// Escape key. Only leaves fullscreen; returns whether anything changed.
    pub fn escape(&mut self) -> bool {
        if *self == PageMode::Fullscreen {
            *self = PageMode::Normal;
            true
        } else {
            false
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        *self == PageMode::Fullscreen
    }

    pub fn toggle_title(&self) -> &'static str {
        match self {
            PageMode::Normal => "Toggle Expand",
            PageMode::Fullscreen => "Exit Fullscreen",
        }
    }

    pub fn aria_pressed(&self) -> bool {
        self.is_fullscreen()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeTier {
    #[default]
    Default,
    Tall,
    Wide,
}

impl SizeTier {
    pub fn next(&self) -> Self {
        match self {
            SizeTier::Default => SizeTier::Tall,
            SizeTier::Tall => SizeTier::Wide,
            SizeTier::Wide => SizeTier::Default,
        }
    }

    pub fn expand_title(&self) -> &'static str {
        match self {
            SizeTier::Default => "Expanded: quarter width, half height",
            SizeTier::Tall => "Expanded: quarter width, full height",
            SizeTier::Wide => "Expanded: half width, full height",
        }
    }

    /// (width, height) share of the host area, as (numerator, denominator) pairs
    pub fn fractions(&self) -> ((u16, u16), (u16, u16)) {
        match self {
            SizeTier::Default => ((1, 4), (1, 2)),
            SizeTier::Tall => ((1, 4), (1, 1)),
            SizeTier::Wide => ((1, 2), (1, 1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetMode {
    #[default]
    Closed,
    Open(SizeTier),
}

impl WidgetMode {
    /// Float-button click. Opens at the default tier; hides the widget if it
    /// is somehow already open.
    pub fn float_click(&mut self) {
        *self = match self {
            WidgetMode::Closed => WidgetMode::Open(SizeTier::Default),
            WidgetMode::Open(_) => WidgetMode::Closed,
        };
    }

    /// Close-button click. The tier is dropped with the open state.
    pub fn close_click(&mut self) {
        *self = WidgetMode::Closed;
    }

    /// Expand-button click. From closed this opens at the default tier and
    /// advances once in the same gesture, landing on `Tall`.
    pub fn expand_click(&mut self) {
        let current = match self {
            WidgetMode::Closed => SizeTier::Default,
            WidgetMode::Open(tier) => *tier,
        };
        *self = WidgetMode::Open(current.next());
    }

    pub fn is_open(&self) -> bool {
        matches!(self, WidgetMode::Open(_))
    }

    pub fn tier(&self) -> Option<SizeTier> {
        match self {
            WidgetMode::Closed => None,
            WidgetMode::Open(tier) => Some(*tier),
        }
    }

    pub fn float_button_visible(&self) -> bool {
        !self.is_open()
    }

    /// Expand-button title; a closed widget advertises the default tier.
    pub fn expand_title(&self) -> &'static str {
        self.tier().unwrap_or_default().expand_title()
    }
}

/// Last known pointer position within a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pointer {
    #[default]
    Center,
    At { x: u16, y: u16 },
}

/// Cosmetic hover tracker behind the border gradient
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    pointer: Pointer,
}

impl PointerTracker {
    pub fn moved(&mut self, x: u16, y: u16) {
        self.pointer = Pointer::At { x, y };
    }

    pub fn left(&mut self) {
        self.pointer = Pointer::Center;
    }

    pub fn position(&self) -> Pointer {
        self.pointer
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self.pointer, Pointer::At { .. })
    }

    /// Horizontal pointer position as a 0..=100 percentage of `width`
    pub fn x_percent(&self, width: u16) -> u16 {
        match self.pointer {
            Pointer::Center => 50,
            Pointer::At { x, .. } if width > 0 => ((x.min(width) as u32 * 100) / width as u32) as u16,
            Pointer::At { .. } => 50,
        }
    }
}
