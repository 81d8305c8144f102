use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Labels at or above this many characters get a row to themselves.
const LONG_LABEL: usize = 8;

/// Inline keyboard for one question. Button payload is
/// `"{question_index}#{choice}"`, the format the callback parser splits.
pub(crate) fn answer_keyboard(question_index: usize, choices: &[String]) -> InlineKeyboardMarkup {
    let buttons = choices
        .iter()
        .map(|choice| {
            InlineKeyboardButton::callback(choice.as_str(), format!("{question_index}#{choice}"))
        })
        .collect();

    InlineKeyboardMarkup::new(balance_rows(buttons))
}

/// Greedy single-pass layout: a long label always starts (and fills) its own
/// row; short labels pack into the previous row unless that row was opened
/// by a long label. Input order is preserved.
fn balance_rows(buttons: Vec<InlineKeyboardButton>) -> Vec<Vec<InlineKeyboardButton>> {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    let mut previous_was_long = false;

    for button in buttons {
        if button.text.chars().count() >= LONG_LABEL {
            rows.push(vec![button]);
            previous_was_long = true;
        } else {
            match rows.last_mut() {
                Some(row) if !previous_was_long => row.push(button),
                _ => rows.push(vec![button]),
            }
            previous_was_long = false;
        }
    }

    rows
}
