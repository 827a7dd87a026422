/// Entries offered by the playlist overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PickerItem {
    Song { index: usize, title: String },
    LoadPlaylist,
}

impl PickerItem {
    pub(crate) fn label(&self) -> String {
        match self {
            PickerItem::Song { index, title } => format!("{:>3}. {title}", index + 1),
            PickerItem::LoadPlaylist => "LOAD PLAYLIST".to_string(),
        }
    }
}

/// State of the playlist overlay: song titles plus a final entry that opens
/// the file prompt.
pub(crate) struct PlaylistPicker {
    pub(crate) items: Vec<PickerItem>,
    pub(crate) selected: usize,
    /// Song showing when the overlay opened, highlighted in the list.
    pub(crate) current: Option<usize>,
}

impl PlaylistPicker {
    pub(crate) fn new(titles: Vec<String>, current: Option<usize>) -> Self {
        let mut items: Vec<PickerItem> = titles
            .into_iter()
            .enumerate()
            .map(|(index, title)| PickerItem::Song { index, title })
            .collect();
        items.push(PickerItem::LoadPlaylist);
        let selected = current.filter(|idx| *idx + 1 < items.len()).unwrap_or(0);
        Self {
            items,
            selected,
            current,
        }
    }

    pub(crate) fn current_item(&self) -> Option<&PickerItem> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.selected = self.items.len() - 1;
        }
    }
}
