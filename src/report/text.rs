use crate::pipeline::stage4_rank::Leaderboard;

pub fn render_leaderboard_text(leaderboard: &Leaderboard) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<15} {:<10}\n", "Team", "Score"));
    out.push_str(&"-".repeat(25));
    out.push('\n');
    for standing in &leaderboard.standings {
        out.push_str(&format!("{:<15} {:<10.4}\n", standing.team, standing.score));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
