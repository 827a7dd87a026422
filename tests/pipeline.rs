use std::fs;

use chordpro_viewer::chordpro::format_song;
use chordpro_viewer::db::{open_in_memory, save_playlist};
use chordpro_viewer::layout::{layout_song, RowKind};
use chordpro_viewer::models::Field;
use chordpro_viewer::prefs::DisplayPreferences;
use chordpro_viewer::scroll::{ScrollConfig, ScrollPhase, TICK_MS};
use chordpro_viewer::session::{Action, SessionEvent};
use chordpro_viewer::{load_playlist, load_playlist_file, PlaylistError, Session};

const SETLIST: &str = "\
 Title ,Lyrics,Key,BPM,Length,Capo
Amazing Grace,\"{Verse 1}\\n[G]Amazing [C]grace how [G]sweet\\n\\n{c: Chorus}\\n[D]Saved a [G]wretch\",G,72,0:30,2
,,,,,
Be Thou My Vision,\"[D]Be thou my [G]vision\",D,96,0:20,
";

fn write_setlist(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn drive(session: &mut Session, from: u64, to: u64) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let mut now = from;
    while now <= to {
        events.extend(session.tick(now));
        now += TICK_MS;
    }
    events
}

#[test]
fn file_to_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_setlist(&dir, "sunday-morning_set.CSV", SETLIST);

    let playlist = load_playlist_file(&path).unwrap();
    assert_eq!(playlist.name, "sunday morning set");
    assert_eq!(playlist.len(), 2);

    let song = playlist.get(0).unwrap();
    assert_eq!(song.get(Field::Title), Some("Amazing Grace"));
    assert_eq!(song.tempo_bpm(), 72.0);

    let rendered = format_song(song.lyrics());
    assert_eq!(rendered.sections.len(), 2);
    assert_eq!(rendered.sections[1].header.as_deref(), Some("CHORUS"));

    let layout = layout_song(&rendered, 60, &DisplayPreferences::default());
    assert_eq!(layout.section_starts.len(), 2);
    assert_eq!(layout.rows[0].kind, RowKind::Header);
}

#[test]
fn wrong_files_are_rejected_without_touching_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let txt = write_setlist(&dir, "set.txt", SETLIST);
    let err = load_playlist_file(&txt).unwrap_err();
    assert!(matches!(err, PlaylistError::NotCsv(_)));
    assert!(err.is_selection_error());

    let blank = write_setlist(&dir, "blank.csv", "title,lyrics\n , \n");
    assert!(matches!(
        load_playlist_file(&blank).unwrap_err(),
        PlaylistError::NoSongs
    ));

    let missing = dir.path().join("missing.csv");
    assert!(matches!(
        load_playlist_file(&missing).unwrap_err(),
        PlaylistError::Read { .. }
    ));
}

#[test]
fn autoplay_runs_the_whole_setlist() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_setlist(&dir, "set.csv", SETLIST);
    let playlist = load_playlist_file(&path).unwrap();

    let config = ScrollConfig::with_preroll_secs(1);
    let mut session = Session::new(config, DisplayPreferences::default());
    session.resize(30, 3);
    session.load_playlist(playlist, 0);

    session.apply(Action::ToggleAutoPlay, 0);
    assert!(matches!(session.scroll_phase(), ScrollPhase::Armed { .. }));
    assert!(session.pulse_lit(0));

    let events = drive(&mut session, 0, 120_000);
    assert!(events.contains(&SessionEvent::SongAdvanced(1)));
    assert!(events.contains(&SessionEvent::EndOfPlaylist));
    assert_eq!(session.current_index(), 1);
    assert!(!session.autoplay_enabled());
    assert_eq!(session.scroll_phase(), ScrollPhase::Idle);
}

#[test]
fn manual_scroll_reseeds_running_autoscroll() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_setlist(&dir, "set.csv", SETLIST);
    let playlist = load_playlist_file(&path).unwrap();

    let config = ScrollConfig::with_preroll_secs(0);
    let mut session = Session::new(config, DisplayPreferences::default());
    session.resize(20, 2);
    session.load_playlist(playlist, 0);
    session.scroll_by(2);
    assert!(session.apply(Action::ToggleAutoScroll, 0));
    assert!(matches!(session.scroll_phase(), ScrollPhase::Scrolling { .. }));

    session.apply(Action::ScrollToTop, 0);
    let ScrollPhase::Scrolling { position, .. } = session.scroll_phase() else {
        panic!("auto-scroll should keep running");
    };
    assert_eq!(position, 0.0);
}

#[test]
fn stored_playlist_restores_the_same_songs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_setlist(&dir, "set.csv", SETLIST);
    let playlist = load_playlist_file(&path).unwrap();

    let conn = open_in_memory().unwrap();
    save_playlist(&conn, &playlist).unwrap();
    let restored = load_playlist(&conn).unwrap().unwrap();
    assert_eq!(restored.name, playlist.name);
    assert_eq!(restored.len(), playlist.len());
    assert_eq!(
        restored.get(1).and_then(|song| song.title()),
        Some("Be Thou My Vision")
    );
}
