//! Column definitions and the inline styles for pinned (sticky) columns.

use maud::Markup;

/// The default width of a column in pixels.
pub const DEFAULT_COLUMN_SIZE: u32 = 150;

/// Which edge of the table a column sticks to when the table scrolls sideways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinSide {
    Left,
    Right,
}

/// How a column is laid out, independent of the rows it displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub pin: Option<PinSide>,
    pub size: u32,
}

/// A column of a [TabularView](crate::table::TabularView) over rows of type `T`.
pub struct ColumnDef<'a, T> {
    /// Unique within a table. Used as the key for sorting and filtering.
    pub id: &'a str,
    pub header: &'a str,
    pub sortable: bool,
    pub visible: bool,
    pub pin: Option<PinSide>,
    pub size: u32,
    cell: Box<dyn Fn(&T) -> Markup + 'a>,
}

impl<'a, T> ColumnDef<'a, T> {
    /// A visible, unpinned, unsortable column that renders each row with `cell`.
    pub fn new(id: &'a str, header: &'a str, cell: impl Fn(&T) -> Markup + 'a) -> Self {
        Self {
            id,
            header,
            sortable: false,
            visible: true,
            pin: None,
            size: DEFAULT_COLUMN_SIZE,
            cell: Box::new(cell),
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn pinned(mut self, side: PinSide) -> Self {
        self.pin = Some(side);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn layout(&self) -> ColumnLayout {
        ColumnLayout {
            pin: self.pin,
            size: self.size,
        }
    }

    pub fn render_cell(&self, row: &T) -> Markup {
        (self.cell)(row)
    }
}

/// The inline style for each column in `columns`, in the same order.
///
/// `columns` should only contain the visible columns, in display order.
/// Left pinned columns are offset by the widths of the left pinned columns
/// before them, right pinned columns by the widths of the right pinned
/// columns after them. The pinned columns next to the unpinned area get an
/// inset shadow as a separator.
pub fn pinning_styles(columns: &[ColumnLayout]) -> Vec<String> {
    let last_left = columns
        .iter()
        .rposition(|column| column.pin == Some(PinSide::Left));
    let first_right = columns
        .iter()
        .position(|column| column.pin == Some(PinSide::Right));

    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut declarations = Vec::with_capacity(6);

            if Some(index) == last_left {
                declarations.push("box-shadow: -1px 0 1px -1px gray inset".to_owned());
            } else if Some(index) == first_right {
                declarations.push("box-shadow: 1px 0 1px -1px gray inset".to_owned());
            }

            match column.pin {
                Some(PinSide::Left) => {
                    let start: u32 = columns[..index]
                        .iter()
                        .filter(|other| other.pin == Some(PinSide::Left))
                        .map(|other| other.size)
                        .sum();
                    declarations.push(format!("left: {start}px"));
                }
                Some(PinSide::Right) => {
                    let after: u32 = columns[index + 1..]
                        .iter()
                        .filter(|other| other.pin == Some(PinSide::Right))
                        .map(|other| other.size)
                        .sum();
                    declarations.push(format!("right: {after}px"));
                }
                None => {}
            }

            let (opacity, position, z_index) = match column.pin {
                Some(_) => ("0.95", "sticky", 1),
                None => ("1", "relative", 0),
            };

            declarations.push(format!("opacity: {opacity}"));
            declarations.push(format!("position: {position}"));
            declarations.push(format!("width: {}px", column.size));
            declarations.push(format!("z-index: {z_index}"));

            declarations.join("; ")
        })
        .collect()
}

#[cfg(test)]
mod pinning_styles_tests {
    use super::{ColumnLayout, PinSide, pinning_styles};

    fn column(pin: Option<PinSide>, size: u32) -> ColumnLayout {
        ColumnLayout { pin, size }
    }

    #[test]
    fn unpinned_column_is_relative() {
        let styles = pinning_styles(&[column(None, 150)]);

        assert_eq!(
            styles,
            ["opacity: 1; position: relative; width: 150px; z-index: 0"]
        );
    }

    #[test]
    fn left_pinned_columns_are_offset_by_earlier_pinned_widths() {
        let styles = pinning_styles(&[
            column(Some(PinSide::Left), 32),
            column(Some(PinSide::Left), 100),
            column(None, 150),
        ]);

        assert_eq!(
            styles[0],
            "left: 0px; opacity: 0.95; position: sticky; width: 32px; z-index: 1"
        );
        assert_eq!(
            styles[1],
            "box-shadow: -1px 0 1px -1px gray inset; left: 32px; opacity: 0.95; \
            position: sticky; width: 100px; z-index: 1"
        );
    }

    #[test]
    fn right_pinned_columns_are_offset_by_later_pinned_widths() {
        let styles = pinning_styles(&[
            column(None, 150),
            column(Some(PinSide::Right), 120),
            column(Some(PinSide::Right), 80),
        ]);

        assert_eq!(
            styles[1],
            "box-shadow: 1px 0 1px -1px gray inset; right: 80px; opacity: 0.95; \
            position: sticky; width: 120px; z-index: 1"
        );
        assert_eq!(
            styles[2],
            "right: 0px; opacity: 0.95; position: sticky; width: 80px; z-index: 1"
        );
    }
}
