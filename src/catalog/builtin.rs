// Built-in stage texts for reproducing experiment stimuli from a paper.
// These are handed out verbatim; the controller never looks inside them.

pub const OVERVIEW: &str = r#"
You are reconstructing the stimuli and flow of psychology experiments from a paper.
Process outline:
- Start with Preparation, then Step 1-4 in order; only move forward when each stage is done.
- Always cross-check the paper text and referenced figures; do not invent stimulus details.
- Every image stimulus node from the flowchart must have its own generated image. Do not add text or titles inside stimuli; save guidance text as per-trial .txt files instead.
- Canvas matters: set explicit resolution and background; use defaults only when unspecified.
- Output SVG and matching JPG under output/<experiment-number>; add filename suffixes when you need to disambiguate.
- Work sequentially per experiment; add --limit and timeouts for quick checks; inspect JPGs and logs; iterate until visuals match the paper.
"#;

pub const PREPARATION: &str = r#"
Preparation
- Inputs: markdown research paper with detailed methods; referenced figure files; any public data archives (zip/rar/tar.gz/xlsx/docx/etc.).
- Read the full paper, in multiple passes if it is large.
- Enumerate all figures used as stimulus examples and view each one so later parameters are anchored to real visuals.
"#;

pub const IDENTIFICATION: &str = r#"
Step 1: Experiment Identification
- List all experiments (Exp1, Exp1a, ...) with their numbering and names.
- Extract objectives and hypotheses for each.
- If the paper is large, read in passes but ensure full coverage.
"#;

pub const FLOWCHARTS: &str = r#"
Step 2: Flowcharts to exp_design.md
- For each experiment, create a Mermaid graph with no parentheses in labels; label node types explicitly:
  * Image Stimulus, Text Stimulus, Interaction, Timing.
- Outside the graph, annotate nodes:
  * Text Stimulus: task instructions, guidance text, feedback.
  * Image Stimulus: composition and layout, elements, color/shape/size; cite figure examples.
  * User Interaction: exact actions (key/mouse/verbal) and recorded metrics (RT ms, accuracy %, choices, error types).
- If experiments are similar, list the precise differences between them.
"#;

pub const VISUAL_PARAMETERS: &str = r#"
Step 3: Visual Stimulus Parameters (exp_design.md)
- For every image node: give number, description, and usage context.
- Quote the paper for every parameter source and map it to the corresponding figure.
- Inspect every example stimulus image to ground details.
- Specify what is required to recreate each stimulus: position (X,Y), shape, size, rotation, canvas resolution and background color (white if unspecified), color values, transparency, border and fill.
- Record relative size and position whenever shapes are combined into one stimulus.
- Mark which parameters are random and which are recorded; list every case for recorded parameters.
- Visual angle to pixels: use the paper's screen size, resolution and viewing distance; if missing, assume a 17" CRT at 1024x768, D=50cm, DPI~75.3.
  S = 2*D*tan(theta/2); P = S*DPI/2.54.
- All size parameters carry both visual angle and pixel values.
"#;

pub const DATA_CHECK: &str = r#"
Code Generation - Step 1: Public Data Check
- Load every public data file with scripts: every sheet of each workbook, every file inside each archive.
- Verify each expected parameter from Preparation is recorded; document compromises or invented mappings.
- Cross-check the design against the data and re-read tagged figures to avoid misinterpretation.
- Append notes to exp_design.md: randomized vs. recorded vs. unused parameters, file-to-experiment mapping, actual column names and their meaning. Do not delete earlier content.
- Stay in this verification loop until every experiment's parameters are confirmed; only then proceed to coding.
"#;

pub const CODE_GUIDELINES: &str = r#"
Code Generation Guidelines (applies to every experiment)
- Create one folder per experiment with its own environment and dependency manifest.
- Output SVG and JPG per image stimulus under output/<experiment-number>.
- Work one experiment at a time; add --limit for trial count; log the parameters of every image at debug level.
- After coding an experiment, run it quickly with a timeout and a small --limit; inspect JPGs and logs; iterate.
- Each image stimulus node gets its own file. Never render text labels inside images; use filename suffixes instead.
- Respect canvas size and background; match paper figures closely rather than guessing.
- Text stimuli and instructions are saved as per-trial .txt files.
"#;

pub const UNIT_IMPLEMENTATION: &str = r#"
Code Generation - Step 2: Implementation ({unit})
- Re-check the existing implementation against the Code Generation Guidelines so earlier experiments keep working.
- Implement the stimuli recorded for {unit} without breaking completed reproductions; keep canvas parameters, output directories and logging consistent.
- When done, run with a small --limit and review the generated JPGs and debug logs.
"#;

pub const UNIT_EXECUTION: &str = r#"
Code Execution - Step 3 ({unit})
- Once a small batch passes, raise the log level, remove the timeout and limit, and generate all stimuli.
- Verify the JPG count matches expectations for {unit}. Read the JPGs to confirm fidelity.
- Do not move to the report stage until every experiment has completed full-size generation and validation.
"#;

pub const REPORT: &str = r#"
Step 4: Report
- Write report.md summarizing coding difficulties, risks of deviation from the original stimuli, and run instructions to reproduce the images.
"#;
