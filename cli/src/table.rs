// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use colored::{Color, Colorize};
use unicode_width::UnicodeWidthStr;

/// Rows of `T` rendered as aligned text columns.
pub struct Table<'a, T, C: Column<T>> {
    pub columns: &'a [C],
    pub separator: &'a str,
    pub header: bool,
    pub data: &'a [T],
}

impl<T, C: Column<T>> fmt::Display for Table<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .data
            .iter()
            .map(|row| self.columns.iter().map(|col| col.format(row)).collect())
            .collect();

        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .map(|col| if self.header { col.name().width() } else { 0 })
            .collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        if self.header {
            let names: Vec<String> = self.columns.iter().map(|c| c.name().to_string()).collect();
            self.write_row(f, &names, &widths, |_, cell| cell.bold().to_string())?;
        }
        for (cells, row) in rows.iter().zip(self.data) {
            self.write_row(f, cells, &widths, |col, cell| match col.color(row) {
                Some(color) => cell.color(color).to_string(),
                None => cell,
            })?;
        }
        Ok(())
    }
}

impl<T, C: Column<T>> Table<'_, T, C> {
    fn write_row(
        &self,
        f: &mut fmt::Formatter<'_>,
        cells: &[String],
        widths: &[usize],
        stylize: impl Fn(&C, String) -> String,
    ) -> fmt::Result {
        let last = cells.len().saturating_sub(1);
        for (i, ((col, cell), width)) in self.columns.iter().zip(cells).zip(widths).enumerate() {
            // pad before coloring, escape codes have no width
            let padding = width.saturating_sub(cell.width());
            let cell = match col.padding_direction() {
                PaddingDirection::Left if i == last => cell.clone(),
                PaddingDirection::Left => format!("{cell}{}", " ".repeat(padding)),
                PaddingDirection::Right => format!("{}{cell}", " ".repeat(padding)),
            };
            write!(f, "{}", stylize(col, cell))?;
            if i < last {
                f.write_str(self.separator)?;
            }
        }
        writeln!(f)
    }
}

pub trait Column<T> {
    fn name(&self) -> &'static str;
    fn format(&self, data: &T) -> String;
    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }
    fn color(&self, _data: &T) -> Option<Color> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingDirection {
    Left,
    Right,
}
