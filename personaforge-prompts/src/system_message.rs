//! System message assembly, spec §4.10 step 1: persona voice/style, time
//! context, terse emotion/trajectory hints (sentences, never a bullet dump
//! of raw metrics), the memory narrative, and the thread summary, folded
//! into one system message.

use chrono::{DateTime, Utc};
use personaforge_flow::{FlowResult, Trajectory, TrajectoryDirection, TrajectoryMomentum};
use personaforge_persona::PersonaDefinition;
use personaforge_types::EmotionSignal;

pub fn build_system_message(
    persona: &PersonaDefinition,
    now: DateTime<Utc>,
    emotion: Option<&EmotionSignal>,
    flow: Option<&FlowResult>,
    trajectory: Option<&Trajectory>,
    memory_narrative: &str,
    session_summary: Option<&str>,
) -> String {
    let mut sections = Vec::new();

    sections.push(persona_voice_section(persona));
    sections.push(format!("Current time: {}.", now.format("%A, %B %-d, %Y at %H:%M UTC")));

    if let Some(hint) = emotion_hint(emotion, trajectory) {
        sections.push(hint);
    }
    if let Some(hint) = flow_hint(flow) {
        sections.push(hint);
    }
    if let Some(summary) = session_summary {
        if !summary.trim().is_empty() {
            sections.push(format!("Earlier in this thread: {summary}"));
        }
    }
    if !memory_narrative.trim().is_empty() {
        sections.push(memory_narrative.to_string());
    }

    sections.join("\n\n")
}

fn persona_voice_section(persona: &PersonaDefinition) -> String {
    let mut text = format!(
        "You are {}. Personality: {}. Communication style: {}.",
        persona.display_name, persona.personality, persona.communication_style
    );
    if let Some(voice) = &persona.voice {
        text.push_str(&format!(" Voice: {voice}."));
    }
    if let Some(background) = &persona.background {
        text.push_str(&format!(" Background: {background}."));
    }
    text
}

fn emotion_hint(emotion: Option<&EmotionSignal>, trajectory: Option<&Trajectory>) -> Option<String> {
    let emotion = emotion?;
    let mut sentence = format!("The user currently seems {}.", emotion.primary_emotion.as_str());
    if let Some(traj) = trajectory {
        let direction = match traj.direction {
            TrajectoryDirection::Improving => "has been improving",
            TrajectoryDirection::Declining => "has been declining",
            TrajectoryDirection::Stable => "has been fairly stable",
        };
        let momentum = match traj.momentum {
            TrajectoryMomentum::PositiveMomentum => " and is currently trending upward",
            TrajectoryMomentum::NegativeMomentum => " and is currently trending downward",
            TrajectoryMomentum::StableMomentum => "",
        };
        sentence.push_str(&format!(" Their mood {direction}{momentum}."));
    }
    Some(sentence)
}

fn flow_hint(flow: Option<&FlowResult>) -> Option<String> {
    let flow = flow?;
    use personaforge_flow::FlowType;
    let sentence = match flow.flow_type {
        FlowType::TopicContinuation => "They appear to be continuing the current topic.",
        FlowType::TopicShift => "They appear to be shifting to a new topic.",
        FlowType::CallbackReference => "They appear to be referencing something from earlier.",
        FlowType::EmotionalProgression => "This message carries emotional weight worth responding to directly.",
        FlowType::Neutral => return None,
    };
    Some(sentence.to_string())
}
