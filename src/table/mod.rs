//! A generic table component with search, column filters, sorting,
//! pagination and row selection.

mod column;
mod filter;
mod pagination;
mod selection;
mod sorting;
mod toolbar;
mod view;

pub use column::{ColumnDef, PinSide};
pub use filter::{ColumnFilters, FilterDescriptor, FilterOption, FilterValue, date_range_value};
pub use pagination::{AutomaticPagination, ManualPagination, PageInfo, last_page_index};
pub use selection::RowSelection;
pub use sorting::SortingState;
pub use toolbar::Search;
pub use view::TabularView;
