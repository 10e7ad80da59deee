use super::metrics::Face;
use super::PageSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mark {
    Text {
        face: Face,
        size: f32,
        x: f32,
        y: f32,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Page {
    pub marks: Vec<Mark>,
}

/// Top-to-bottom flow layout that opens a new page whenever the next line
/// would cross the bottom margin.
pub(crate) struct Layout<'a> {
    settings: &'a PageSettings,
    pages: Vec<Page>,
    cursor: f32,
}

impl<'a> Layout<'a> {
    pub fn new(settings: &'a PageSettings) -> Self {
        Self {
            settings,
            pages: vec![Page::default()],
            cursor: settings.height - settings.margin,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.settings.width - 2.0 * self.settings.margin
    }

    /// Wrap `text` to the content width and lay out every resulting line.
    pub fn paragraph(&mut self, text: &str, face: Face, size: f32, gap: f32, align: Align) {
        if text.trim().is_empty() {
            self.move_down(size + gap);
            return;
        }
        for line in wrap_to_width(text, face, size, self.content_width()) {
            self.line(line, face, size, gap, align);
        }
    }

    pub fn move_down(&mut self, amount: f32) {
        self.cursor -= amount;
        if self.cursor < self.settings.margin {
            self.new_page();
        }
    }

    pub fn rule(&mut self) {
        self.ensure_room(1.0);
        let y = self.cursor;
        let (x1, x2) = (self.settings.margin, self.settings.width - self.settings.margin);
        self.current().marks.push(Mark::Rule { x1, x2, y });
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }

    fn line(&mut self, text: String, face: Face, size: f32, gap: f32, align: Align) {
        self.ensure_room(size + gap);
        let x = match align {
            Align::Left => self.settings.margin,
            Align::Center => {
                let slack = self.content_width() - face.text_width(&text, size);
                self.settings.margin + (slack / 2.0).max(0.0)
            }
        };
        let y = self.cursor - size;
        self.current().marks.push(Mark::Text {
            face,
            size,
            x,
            y,
            text,
        });
        self.cursor -= size + gap;
    }

    fn ensure_room(&mut self, height: f32) {
        let page_has_content = !self.current().marks.is_empty();
        if self.cursor - height < self.settings.margin && page_has_content {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = self.settings.height - self.settings.margin;
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

/// Greedy word wrap by measured width. Words wider than `max_width` are
/// broken between characters.
pub(crate) fn wrap_to_width(text: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if face.text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if face.text_width(word, size) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            let mut next = current.clone();
            next.push(ch);
            if face.text_width(&next, size) > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            } else {
                current = next;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_lines_fit_the_width() {
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        let lines = wrap_to_width(&text, Face::Regular, 12.0, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Face::Regular.text_width(line, 12.0) <= 200.0, "{line}");
        }
        assert_eq!(lines.join(" "), text.trim_end());
    }

    #[test]
    fn overlong_words_are_broken() {
        let word = "x".repeat(200);
        let lines = wrap_to_width(&word, Face::Regular, 12.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn layout_paginates_when_the_page_is_full() {
        let settings = PageSettings::default();
        let mut layout = Layout::new(&settings);
        for i in 0..200 {
            layout.paragraph(&format!("line {i}"), Face::Regular, 12.0, 4.0, Align::Left);
        }
        let pages = layout.finish();
        // (842 - 80) / 16 = 47 lines per page.
        assert_eq!(pages.len(), 5);
        for page in &pages {
            for mark in &page.marks {
                if let Mark::Text { y, .. } = mark {
                    assert!(*y >= settings.margin - 12.0);
                }
            }
        }
    }
}
