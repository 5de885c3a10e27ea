use crate::geometry::Rect;
use crate::layout::LayoutResult;
use crate::registry::Component;
use crate::width::{skip_columns, splice_at_column};

/// Build a full frame of `terminal.height` rows from solved rectangles.
///
/// Components are visited top to bottom; where rows overlap, the component
/// visited later wins.
pub(crate) fn compose_frame<'a>(
    result: &LayoutResult,
    components: impl Iterator<Item = &'a Component>,
) -> String {
    let terminal = result.terminal();
    let mut rows = vec![String::new(); usize::from(terminal.height)];

    let mut placed: Vec<(&Component, Rect)> = components
        .filter_map(|component| result.rect(component.id()).map(|rect| (component, rect)))
        .collect();
    placed.sort_by_key(|(_, rect)| rect.y);

    let screen_width = usize::from(terminal.width);
    for (component, rect) in placed {
        let clip = usize::try_from(-rect.x).unwrap_or(0);
        let column = usize::try_from(rect.x).unwrap_or(0);
        if column >= screen_width {
            continue;
        }
        let visible = usize::from(rect.width)
            .saturating_sub(clip)
            .min(screen_width - column);
        if visible == 0 {
            continue;
        }

        for (offset, line) in component
            .content()
            .lines()
            .take(usize::from(rect.height))
            .enumerate()
        {
            let Ok(row) = usize::try_from(rect.y + offset as i32) else {
                continue;
            };
            let Some(slot) = rows.get_mut(row) else {
                break;
            };
            let line = if clip > 0 {
                skip_columns(line, clip)
            } else {
                line.to_string()
            };
            *slot = splice_at_column(slot, column, &line, visible);
        }
    }

    rows.join("\n")
}

/// Frame used before any layout has ever been solved.
pub(crate) fn stack_contents<'a>(components: impl Iterator<Item = &'a Component>) -> String {
    components
        .map(Component::content)
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
