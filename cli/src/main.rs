use clap::{Parser, Subcommand};
use learnflow::Config;
use learnflow::engine::{ProgressUpdate, SessionContext};
use learnflow::error::{AppError, AppResult, run_with_error_handler};
use learnflow::view::{DashboardSummary, PlayerState};

#[derive(Parser, Debug)]
#[command(about = "Browse courses and track learning progress", long_about = None)]
pub struct Cli {
    /// Read ./config.toml instead of the user config directory
    #[arg(long, global = true, default_value_t = false)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in, creating the account when implicit registration is on
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
    },

    Logout,

    /// Show the signed-in user
    Whoami,

    /// List the catalog
    Courses {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
    },

    Enroll {
        course_id: String,
    },

    /// Mark a lesson as done
    Complete {
        course_id: String,
        lesson_id: String,
    },

    /// Submit quiz answers, e.g. `quiz 1 --answers 0,3,2`
    Quiz {
        course_id: String,
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        answers: Vec<usize>,
    },

    Dashboard,

    /// Show the course player for an enrolled course
    Player {
        course_id: String,
    },

    /// Delete all stored users and progress
    Reset,
}

fn main() {
    learnflow::setup_trace();
    let args = Cli::parse();

    run_with_error_handler(|| match run(args) {
        Err(AppError::EngineError(e)) => {
            eprintln!("{}", e.client_display());
            Err(e.into())
        }
        other => other,
    });
}

fn run(args: Cli) -> AppResult<()> {
    let config = Config::get_or_init(args.local);
    let mut engine = learnflow::build_engine(config)?;
    let mut ctx = engine.restore();

    match args.command {
        Commands::Register { name, email, password } => {
            let user = engine.register(&mut ctx, &name, &email, &password)?;
            println!("Welcome, {}!", user.name());
        }

        Commands::Login { email, password } => {
            let user = engine.login(&mut ctx, &email, &password)?;
            println!("Signed in as {} <{}>", user.name(), user.email());
        }

        Commands::Logout => {
            engine.logout(&mut ctx);
            println!("Signed out.");
        }

        Commands::Whoami => match ctx.user() {
            Some(user) => println!("{} <{}> ({})", user.name(), user.email(), user.id()),
            None => println!("Not signed in."),
        },

        Commands::Courses { search, category } => {
            let catalog = engine.catalog();
            for entry in catalog.categories() {
                print!("{} ({})  ", entry.name, entry.count);
            }
            println!();

            let enrolled = |id: &str| {
                ctx.progress()
                    .is_some_and(|p| p.enrollment(id).is_some())
            };
            for course in catalog.search(&search, category.as_deref()) {
                println!(
                    "[{}] {} by {} | {} | {} | ${:.2} | {:.1}{}",
                    course.id(),
                    course.title(),
                    course.instructor(),
                    course.category(),
                    course.level(),
                    course.price(),
                    course.rating(),
                    if enrolled(course.id()) { " | enrolled" } else { "" },
                );
            }
        }

        Commands::Enroll { course_id } => {
            let enrollment = engine.enroll(&mut ctx, &course_id)?;
            println!(
                "Enrolled in {} ({}/{} lessons done)",
                enrollment.course_id(),
                enrollment.completed_lessons(),
                enrollment.total_lessons()
            );
        }

        Commands::Complete { course_id, lesson_id } => {
            let user_id = ctx.session()?.user().id();
            match engine.complete_lesson(&mut ctx, user_id, &course_id, &lesson_id)? {
                Some(update) => print_update(&update),
                None => println!("Nothing to update, check the course and lesson ids."),
            }
        }

        Commands::Quiz { course_id, answers } => {
            let outcome = engine.submit_quiz(&mut ctx, &course_id, &answers)?;
            println!(
                "Score: {}% ({}/{} correct), {}",
                outcome.grade.score,
                outcome.grade.correct,
                outcome.grade.total,
                if outcome.passed { "passed" } else { "try again" }
            );
            print_update(&outcome.update);
        }

        Commands::Dashboard => print_dashboard(engine.catalog(), &ctx)?,

        Commands::Player { course_id } => {
            let session = ctx.session()?;
            let Some(course) = engine.catalog().find(&course_id) else {
                return Err(learnflow::engine::EngineError::course_not_found(course_id).into());
            };
            let Some(enrollment) = session.progress().enrollment(&course_id) else {
                println!("Not enrolled in {}.", course.title());
                return Ok(());
            };

            let player = PlayerState::build(course, enrollment, engine.rules().quiz_pass_score());
            println!("{} ({:.0}%)", player.title, player.progress);
            for (index, lesson) in player.lessons.iter().enumerate() {
                let marker = if lesson.completed { "x" } else { " " };
                let cursor = if index == player.current_lesson { ">" } else { " " };
                let kind = if lesson.is_quiz { "quiz" } else { "video" };
                println!("{cursor} [{marker}] {} {} ({kind})", lesson.id, lesson.title);
            }
            if let (Some(score), Some(passed)) = (player.quiz_score, player.quiz_passed) {
                println!("Quiz: {score}% {}", if passed { "passed" } else { "not passed" });
            }
        }

        Commands::Reset => {
            engine.reset(&mut ctx);
            println!("All local data removed.");
        }
    }

    Ok(())
}

fn print_update(update: &ProgressUpdate) {
    let e = &update.enrollment;
    println!("Progress: {}/{} lessons", e.completed_lessons(), e.total_lessons());
    if update.course_completed {
        println!("Course completed!");
    }
    if let Some(streak) = update.streak {
        println!("Streak: {streak} day(s)");
    }
    for achievement in &update.earned {
        println!("Achievement unlocked: {} - {}", achievement.title(), achievement.description());
    }
}

fn print_dashboard(catalog: &learnflow::catalog::Catalog, ctx: &SessionContext) -> AppResult<()> {
    let session = ctx.session()?;
    let summary = DashboardSummary::build(catalog, session.progress());

    println!("Welcome back, {}!", session.user().name());
    println!(
        "Courses: {} enrolled, {} completed | Lessons: {}/{} ({:.0}%) | Streak: {}",
        summary.total_enrolled,
        summary.completed_courses,
        summary.completed_lessons,
        summary.total_lessons,
        summary.overall_progress,
        summary.streak
    );

    for course in &summary.courses {
        let quiz = course
            .quiz_score
            .map(|s| format!(", quiz {s}%"))
            .unwrap_or_default();
        println!(
            "  [{}] {}: {}/{} ({:.0}%){quiz}",
            course.course_id, course.title, course.completed_lessons, course.total_lessons, course.progress
        );
    }

    if !summary.achievements.is_empty() {
        println!("Achievements:");
        for badge in &summary.achievements {
            println!("  {} - {}", badge.title, badge.description);
        }
    }

    if !summary.recent_activity.is_empty() {
        println!("Recent activity:");
        for entry in &summary.recent_activity {
            println!(
                "  {} {}: {}",
                entry.completed_at.format("%Y-%m-%d %H:%M"),
                entry.course_title,
                entry.lesson_title
            );
        }
    }

    Ok(())
}
