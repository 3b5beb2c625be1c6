//! Text rendering of display events for the local screen.

use contracts::AnnouncementEvent;

/// One line per display event
pub fn render_event(event: &AnnouncementEvent) -> String {
    match event {
        AnnouncementEvent::ProgramSelected(p) => {
            format!("▶ {} [{}]", p.program_name, p.section)
        }
        AnnouncementEvent::ResultSelected(r) => {
            let result = &r.result;
            let mut line = format!("  {:>3}  {}", result.position, result.name);
            if !result.team.is_empty() {
                line.push_str(&format!(" ({})", result.team));
            }
            if !result.grade.is_empty() {
                line.push_str(&format!("  grade {}", result.grade));
            }
            if let Some(chest) = &result.chest_no {
                line.push_str(&format!("  chest {chest}"));
            }
            line
        }
    }
}
